//! Groups units from a [`UnitSplitter`] into bounded-size chunks.

use std::io;
use std::iter::FusedIterator;

use tracing::debug;

use crate::splitter::UnitSplitter;

/// Default chunk size cap, in characters.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 25_000;

/// Lazy, single-pass iterator of chunks.
///
/// Units are appended to a buffer until the next unit would push it past
/// `max_chunk_length`; the buffer is then emitted and restarts with that unit. Whatever
/// remains at end of input is emitted as the last chunk. Empty chunks are never emitted.
///
/// A unit that is longer than `max_chunk_length` on its own is emitted unsplit as a
/// single oversized chunk.
///
/// The chunker owns its splitter (and through it the source), so the source is released
/// when the chunker is dropped, whether or not it was fully consumed. After an I/O error
/// the iterator yields the error once and then ends.
#[derive(Debug)]
pub struct Chunker<S> {
    splitter: S,
    max_chunk_length: usize,
    buffer: String,
    buffer_chars: usize,
    exhausted: bool,
}

impl<S: UnitSplitter> Chunker<S> {
    pub fn new(splitter: S, max_chunk_length: usize) -> Self {
        Self {
            splitter,
            max_chunk_length,
            buffer: String::new(),
            buffer_chars: 0,
            exhausted: false,
        }
    }

    pub fn max_chunk_length(&self) -> usize {
        self.max_chunk_length
    }

    fn take_buffer(&mut self) -> String {
        if self.buffer_chars > self.max_chunk_length {
            debug!(
                chunk_chars = self.buffer_chars,
                max_chunk_length = self.max_chunk_length,
                "emitting oversized chunk"
            );
        }
        self.buffer_chars = 0;
        std::mem::take(&mut self.buffer)
    }
}

impl<S: UnitSplitter> Iterator for Chunker<S> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted {
            match self.splitter.next_unit() {
                Ok(Some(unit)) => {
                    let unit_chars = unit.chars().count();
                    if !self.buffer.is_empty()
                        && self.buffer_chars + unit_chars > self.max_chunk_length
                    {
                        let chunk = self.take_buffer();
                        self.buffer = unit;
                        self.buffer_chars = unit_chars;
                        return Some(Ok(chunk));
                    }
                    self.buffer.push_str(&unit);
                    self.buffer_chars += unit_chars;
                }
                Ok(None) => self.exhausted = true,
                Err(e) => {
                    self.exhausted = true;
                    self.buffer.clear();
                    self.buffer_chars = 0;
                    return Some(Err(e));
                }
            }
        }

        if self.buffer.is_empty() {
            None
        } else {
            Some(Ok(self.take_buffer()))
        }
    }
}

impl<S: UnitSplitter> FusedIterator for Chunker<S> {}

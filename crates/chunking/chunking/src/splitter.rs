//! Splitting policies: each pulls the next unit of text from a buffered source.

use std::io::{self, BufRead};

/// Pulls successive units of text from a source.
///
/// Returning `Ok(None)` means the source is exhausted; splitters are single-pass and keep
/// returning `None` afterwards.
pub trait UnitSplitter {
    /// Returns the next unit, or `None` when there is no more data.
    fn next_unit(&mut self) -> io::Result<Option<String>>;
}

impl<S: UnitSplitter + ?Sized> UnitSplitter for Box<S> {
    fn next_unit(&mut self) -> io::Result<Option<String>> {
        (**self).next_unit()
    }
}

/// One unit per line. Line terminators (`\n` or `\r\n`) are consumed unless
/// [`LineSplitter::with_line_endings`] is enabled, in which case each unit that ended
/// with a terminator keeps a single `\n`.
#[derive(Debug)]
pub struct LineSplitter<R> {
    reader: R,
    keep_line_endings: bool,
}

impl<R: BufRead> LineSplitter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            keep_line_endings: false,
        }
    }

    pub fn with_line_endings(mut self, keep: bool) -> Self {
        self.keep_line_endings = keep;
        self
    }
}

impl<R: BufRead> UnitSplitter for LineSplitter<R> {
    fn next_unit(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let terminated = line.ends_with('\n');
        if terminated {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            if self.keep_line_endings {
                line.push('\n');
            }
        }
        Ok(Some(line))
    }
}

/// Incremental boundary detection for [`Lookahead`].
///
/// Characters of the current unit are fed one at a time, each exactly once. Returning
/// `true` means a new unit starts at that character, which is then left unconsumed. A fresh
/// (or reset) scanner never reports a boundary on the first character of a unit.
pub(crate) trait UnitBoundary {
    fn starts_unit(&mut self, c: char) -> bool;
    fn reset(&mut self);
}

/// Line-buffered lookahead shared by the splitters that cut inside lines.
///
/// `pending[start..]` is the unread text; `pending[start..scanned]` has already been fed to
/// the scanner, so every byte is scanned once however many lines a unit spans. The consumed
/// prefix is dropped before the next read.
#[derive(Debug)]
pub(crate) struct Lookahead<R, B> {
    reader: R,
    pub(crate) boundary: B,
    pending: String,
    start: usize,
    scanned: usize,
    eof: bool,
}

impl<R: BufRead, B: UnitBoundary> Lookahead<R, B> {
    pub(crate) fn new(reader: R, boundary: B) -> Self {
        Self {
            reader,
            boundary,
            pending: String::new(),
            start: 0,
            scanned: 0,
            eof: false,
        }
    }

    pub(crate) fn next_unit(&mut self) -> io::Result<Option<String>> {
        loop {
            let scanned = self.scanned;
            let boundary = &mut self.boundary;
            let found = self.pending[scanned..]
                .char_indices()
                .find(|&(_, c)| boundary.starts_unit(c))
                .map(|(offset, _)| scanned + offset);
            if let Some(end) = found {
                return Ok(Some(self.take_until(end)));
            }
            self.scanned = self.pending.len();

            if self.eof {
                if self.start == self.pending.len() {
                    return Ok(None);
                }
                return Ok(Some(self.take_until(self.pending.len())));
            }

            if self.start > 0 {
                self.pending.drain(..self.start);
                self.scanned -= self.start;
                self.start = 0;
            }
            if self.reader.read_line(&mut self.pending)? == 0 {
                self.eof = true;
            }
        }
    }

    fn take_until(&mut self, end: usize) -> String {
        let unit = self.pending[self.start..end].to_string();
        self.start = end;
        self.scanned = end;
        self.boundary.reset();
        unit
    }
}

/// One unit per sentence. A sentence ends at `.`, `!` or `?` (runs such as `?!` or `...`
/// count as one terminator) followed by whitespace; the trailing whitespace stays with the
/// sentence so that units concatenate back to the source text.
#[derive(Debug)]
pub struct SentenceSplitter<R> {
    inner: Lookahead<R, SentenceBoundary>,
}

impl<R: BufRead> SentenceSplitter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: Lookahead::new(reader, SentenceBoundary::Text),
        }
    }
}

fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SentenceBoundary {
    Text,
    Terminator,
    Gap,
}

impl UnitBoundary for SentenceBoundary {
    fn starts_unit(&mut self, c: char) -> bool {
        match *self {
            Self::Gap if !c.is_whitespace() => return true,
            Self::Gap => {}
            _ if is_sentence_terminator(c) => *self = Self::Terminator,
            Self::Terminator if c.is_whitespace() => *self = Self::Gap,
            _ => *self = Self::Text,
        }
        false
    }

    fn reset(&mut self) {
        *self = Self::Text;
    }
}

impl<R: BufRead> UnitSplitter for SentenceSplitter<R> {
    fn next_unit(&mut self) -> io::Result<Option<String>> {
        self.inner.next_unit()
    }
}

/// One unit per whitespace-delimited word, a cheap stand-in for token-based splitting.
/// Whitespace following a word stays with it; leading whitespace joins the first word.
#[derive(Debug)]
pub struct WordSplitter<R> {
    inner: Lookahead<R, WordBoundary>,
}

impl<R: BufRead> WordSplitter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: Lookahead::new(reader, WordBoundary::default()),
        }
    }
}

#[derive(Debug, Default)]
struct WordBoundary {
    seen_word: bool,
    in_gap: bool,
}

impl UnitBoundary for WordBoundary {
    fn starts_unit(&mut self, c: char) -> bool {
        if c.is_whitespace() {
            self.in_gap = self.seen_word;
        } else if self.in_gap {
            return true;
        } else {
            self.seen_word = true;
        }
        false
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl<R: BufRead> UnitSplitter for WordSplitter<R> {
    fn next_unit(&mut self) -> io::Result<Option<String>> {
        self.inner.next_unit()
    }
}

/// Fixed-width units of `width` characters; the last unit may be shorter.
/// Line terminators are ordinary characters here.
#[derive(Debug)]
pub struct FixedWidthSplitter<R> {
    inner: Lookahead<R, WidthBoundary>,
}

impl<R: BufRead> FixedWidthSplitter<R> {
    /// A `width` of zero is treated as one.
    pub fn new(reader: R, width: usize) -> Self {
        Self {
            inner: Lookahead::new(
                reader,
                WidthBoundary {
                    width: width.max(1),
                    count: 0,
                },
            ),
        }
    }
}

#[derive(Debug)]
struct WidthBoundary {
    width: usize,
    count: usize,
}

impl UnitBoundary for WidthBoundary {
    fn starts_unit(&mut self, _c: char) -> bool {
        if self.count == self.width {
            return true;
        }
        self.count += 1;
        false
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

impl<R: BufRead> UnitSplitter for FixedWidthSplitter<R> {
    fn next_unit(&mut self) -> io::Result<Option<String>> {
        self.inner.next_unit()
    }
}

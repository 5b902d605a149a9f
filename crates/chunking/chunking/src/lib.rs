//! # Text Chunking
//!
//! This crate splits a text source into a lazy sequence of bounded-size chunks
//! suitable for sending to a remote embedding model one request at a time.
//!
//! Chunking happens in two layers:
//!
//! - A [`UnitSplitter`] pulls the next *unit* of text from a source (a line, a sentence,
//!   a whitespace-delimited word, or a fixed-width slice).
//! - A [`Chunker`] groups successive units into chunks of at most `max_chunk_length`
//!   characters (Unicode scalar values).
//!
//! A [`ChunkingService`] ties a splitting policy to a maximum chunk length so callers can
//! hold one as `Arc<dyn ChunkingService>` and open a fresh chunker per input text.
//!
//! ## Example
//!
//! ```rust
//! use chunking::{ChunkingService, LineChunking};
//!
//! let chunking = LineChunking::new(100);
//! let chunks: Vec<String> = chunking
//!     .chunk_text("Hello\nworld!")
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(chunks, vec!["Helloworld!".to_string()]);
//! ```
//!
//! ## Oversized units
//!
//! Units are never split. A unit longer than the maximum is emitted alone as an oversized
//! chunk; pick a finer splitting policy (for example [`FixedWidthChunking`]) when every
//! chunk must fit the limit.

mod chunker;
mod service;
mod splitter;

pub use chunker::{Chunker, DEFAULT_MAX_CHUNK_LENGTH};
pub use service::{
    BoxedSource, BoxedSplitter, ChunkingService, FixedWidthChunking, LineChunking,
    SentenceChunking, WordChunking,
};
pub use splitter::{FixedWidthSplitter, LineSplitter, SentenceSplitter, UnitSplitter, WordSplitter};

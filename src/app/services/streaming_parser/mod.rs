//! Chunk-oriented streaming parse
//!
//! [`EventStream`] turns a sequence of byte chunks of any size into a lazy
//! sequence of events. Detection runs once on an opening sample; after that
//! only the trailing partial line is held between chunks. A line that will
//! not split into a complete row under the working delimiter is retried
//! against the format's other layouts, and the one that works is moved to
//! the front for the lines that follow.
//!
//! Reader-backed sources go through [`ReaderChunks`]. A failing chunk source
//! ends the stream with a `StructuralReadError` diagnostic; every event
//! produced before the failure has already been yielded.

pub mod chunks;
pub mod stream;

#[cfg(test)]
mod tests;

pub use chunks::{ReaderChunks, drain_complete_lines};
pub use stream::EventStream;

//! Record input and output at the engine boundary.
//!
//! The engine only requires "decode to an ordered sequence" on the input side
//! and "append, commit, close" on the output side; the concrete encodings
//! here (a JSON customer file, a line-oriented report file) are one choice of
//! collaborator, not part of the engine contract.

mod sink;
mod source;

pub use sink::{LineFileSink, RecordSink, SinkFactory};
pub use source::{JsonFileSource, RecordIter, RecordSource};

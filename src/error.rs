//! Run-level error taxonomy.
//!
//! Filter drops are deliberately *not* errors; they are ordinary
//! [`FilterOutcome`](crate::filter::FilterOutcome) values. Only failures that
//! terminate a run (or prevent construction) live here.

use thiserror::Error;

/// Fatal failure of a batch run or of engine construction.
///
/// Variants carry rendered detail strings so a terminal
/// [`RunStatus`](crate::pipeline::RunStatus) can be cloned into the
/// execution registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The input could not be opened or decoded at run start.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// A chunk commit failed partway through a run. Chunks committed
    /// before the failure remain persisted.
    #[error("sink write failed: {0}")]
    SinkWrite(String),

    /// Nonsensical wiring detected before any run started.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

//! Record sinks.

use std::fmt::Display;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write as _;
use std::path::PathBuf;

use crate::error::JobError;

/// Append-only sink for one run's kept records.
///
/// Appends accumulate until `commit` makes them durable as one unit; the
/// chunk writer calls `commit` exactly once per chunk. Dropping a sink
/// releases the underlying resource without committing pending appends.
pub trait RecordSink<R>: Send {
    /// Stage one record for the current commit unit.
    fn append(&mut self, record: &R) -> Result<(), JobError>;

    /// Persist everything appended since the last commit.
    fn commit(&mut self) -> Result<(), JobError>;

    /// Flush and release the sink after the final commit.
    fn close(&mut self) -> Result<(), JobError>;
}

/// Opens a fresh sink for each run.
pub trait SinkFactory<R>: Send + Sync {
    /// Open the sink; called once at the start of every run.
    fn open(&self) -> Result<Box<dyn RecordSink<R>>, JobError>;
}

/// Factory for line-oriented report files.
///
/// Each run truncates and rewrites the file; one rendered record per line.
pub struct LineFileSink {
    path: PathBuf,
}

impl LineFileSink {
    /// Create a factory writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl<R: Display + 'static> SinkFactory<R> for LineFileSink {
    fn open(&self) -> Result<Box<dyn RecordSink<R>>, JobError> {
        let file = File::create(&self.path)
            .map_err(|e| JobError::SinkWrite(format!("{}: {e}", self.path.display())))?;
        tracing::debug!("opened report sink {}", self.path.display());
        Ok(Box::new(LineFileWriter {
            path: self.path.clone(),
            file,
            pending: String::new(),
        }))
    }
}

/// Line writer that buffers a chunk's lines in memory until commit, so a
/// failed chunk leaves no partial lines in the file.
struct LineFileWriter {
    path: PathBuf,
    file: File,
    pending: String,
}

impl LineFileWriter {
    fn write_error(&self, e: impl Display) -> JobError {
        JobError::SinkWrite(format!("{}: {e}", self.path.display()))
    }
}

impl<R: Display> RecordSink<R> for LineFileWriter {
    fn append(&mut self, record: &R) -> Result<(), JobError> {
        writeln!(self.pending, "{record}")
            .map_err(|e| JobError::SinkWrite(format!("render record: {e}")))
    }

    fn commit(&mut self) -> Result<(), JobError> {
        self.file
            .write_all(self.pending.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|e| self.write_error(e))?;
        self.pending.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<(), JobError> {
        self.file.sync_all().map_err(|e| self.write_error(e))
    }
}

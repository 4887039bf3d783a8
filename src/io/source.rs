//! Record sources.

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::marker::PhantomData;
use std::path::PathBuf;

use crate::error::JobError;

/// Ordered, finite sequence of records for one run.
pub type RecordIter<R> = Box<dyn Iterator<Item = R> + Send>;

/// Produces the full ordered sequence of input records for one run.
///
/// Every `open` call decodes the underlying store once and returns a fresh
/// sequence; a sequence is never rewound in place. End of sequence is the
/// iterator's natural exhaustion, not an error.
pub trait RecordSource<R>: Send + Sync {
    /// Open a fresh pass over the input.
    ///
    /// Fails with [`JobError::SourceUnavailable`] if the store cannot be
    /// reached or decoded; that is fatal to the run and not retried.
    fn open(&self) -> Result<RecordIter<R>, JobError>;
}

/// Source backed by a JSON array file, decoded in one shot at `open`.
pub struct JsonFileSource<R> {
    path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R> JsonFileSource<R> {
    /// Create a source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }
}

impl<R> RecordSource<R> for JsonFileSource<R>
where
    R: DeserializeOwned + Send + 'static,
{
    fn open(&self) -> Result<RecordIter<R>, JobError> {
        let file = File::open(&self.path).map_err(|e| {
            JobError::SourceUnavailable(format!("{}: {e}", self.path.display()))
        })?;

        let records: Vec<R> = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            JobError::SourceUnavailable(format!("{}: {e}", self.path.display()))
        })?;

        tracing::debug!(
            "decoded {} records from {}",
            records.len(),
            self.path.display()
        );
        Ok(Box::new(records.into_iter()))
    }
}

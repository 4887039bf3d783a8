//! Chunk buffering and commit.

use crate::error::JobError;
use crate::io::RecordSink;

/// Buffers kept records and commits them to the sink in fixed-size chunks.
///
/// Every committed chunk except possibly the trailing one holds exactly
/// `chunk_size` records. The written count advances only when a commit
/// succeeds, so a failed chunk never inflates it.
pub struct ChunkWriter<R> {
    sink: Box<dyn RecordSink<R>>,
    buffer: Vec<R>,
    chunk_size: usize,
    chunks_committed: u64,
    records_written: u64,
}

/// Totals from a finished writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteTotals {
    /// Records in successfully committed chunks.
    pub records_written: u64,

    /// Chunks committed.
    pub chunks_committed: u64,
}

impl<R> ChunkWriter<R> {
    /// Create a writer committing `chunk_size` records at a time.
    pub fn new(sink: Box<dyn RecordSink<R>>, chunk_size: usize) -> Result<Self, JobError> {
        if chunk_size == 0 {
            return Err(JobError::Configuration("chunk size must be > 0".into()));
        }
        Ok(Self {
            sink,
            buffer: Vec::with_capacity(chunk_size),
            chunk_size,
            chunks_committed: 0,
            records_written: 0,
        })
    }

    /// Append one record, committing the chunk when it reaches `chunk_size`.
    pub fn add(&mut self, record: R) -> Result<(), JobError> {
        self.buffer.push(record);
        if self.buffer.len() >= self.chunk_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Commit the buffered chunk, if any.
    fn flush(&mut self) -> Result<(), JobError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        for record in &self.buffer {
            self.sink.append(record)?;
        }
        self.sink.commit()?;

        self.records_written += self.buffer.len() as u64;
        self.chunks_committed += 1;
        tracing::debug!(
            "committed chunk {} ({} records)",
            self.chunks_committed,
            self.buffer.len()
        );
        self.buffer.clear();
        Ok(())
    }

    /// Records in successfully committed chunks so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Commit the trailing partial chunk and close the sink.
    ///
    /// On the failure path the writer is simply dropped instead, which
    /// releases the sink without committing the in-flight chunk.
    pub fn finish(mut self) -> Result<WriteTotals, JobError> {
        self.flush()?;
        self.sink.close()?;
        Ok(WriteTotals {
            records_written: self.records_written,
            chunks_committed: self.chunks_committed,
        })
    }
}

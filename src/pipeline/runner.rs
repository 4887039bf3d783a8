//! One run of the chunked job.

use std::fmt;
use std::sync::Arc;

use crate::error::JobError;
use crate::filter::{FilterChain, FilterOutcome};
use crate::io::{RecordSource, SinkFactory};
use crate::pipeline::chunk_writer::ChunkWriter;
use crate::pipeline::scheduler::RunToken;
use crate::record::Record;

/// Builds a fresh filter chain at the start of every run.
///
/// Rebuilding per run lets predicates capture run-time context (such as the
/// current date) without any state leaking between runs.
pub type ChainFactory<R> = dyn Fn() -> FilterChain<R> + Send + Sync;

/// Counters carried by a terminal [`RunStatus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    /// Records pulled from the source.
    pub read: u64,

    /// Records kept by every stage of the chain.
    pub kept: u64,

    /// Records in successfully committed chunks.
    pub written: u64,
}

impl fmt::Display for RunCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read={} kept={} written={}",
            self.read, self.kept, self.written
        )
    }
}

/// Terminal outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The source was drained and every chunk committed.
    Completed(RunCounts),

    /// A fatal source or sink failure ended the run early. Chunks committed
    /// before the failure remain persisted.
    Failed {
        /// Counters at the moment of failure.
        counts: RunCounts,
        /// What ended the run.
        cause: JobError,
    },
}

impl RunStatus {
    /// Check if the run completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed(_))
    }

    /// Check if the run failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, RunStatus::Failed { .. })
    }

    /// The counters, regardless of outcome.
    pub fn counts(&self) -> RunCounts {
        match self {
            RunStatus::Completed(counts) => *counts,
            RunStatus::Failed { counts, .. } => *counts,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed(counts) => write!(f, "COMPLETED ({counts})"),
            RunStatus::Failed { counts, cause } => {
                write!(f, "FAILED ({counts}): {cause}")
            }
        }
    }
}

/// Drives the read → filter → buffer → commit loop for one run.
///
/// The source sequence, filter chain, and chunk writer are constructed fresh
/// inside [`run`](ChunkedJobRunner::run) and discarded at its end; the only
/// cross-run state in the system is the execution registry, which the
/// scheduler owns.
pub struct ChunkedJobRunner<R> {
    source: Arc<dyn RecordSource<R>>,
    sink: Arc<dyn SinkFactory<R>>,
    chain: Arc<ChainFactory<R>>,
    chunk_size: usize,
}

impl<R: Record> ChunkedJobRunner<R> {
    /// Wire a runner. Fails fast on a nonsensical chunk size.
    pub fn new(
        source: Arc<dyn RecordSource<R>>,
        sink: Arc<dyn SinkFactory<R>>,
        chain: Arc<ChainFactory<R>>,
        chunk_size: usize,
    ) -> Result<Self, JobError> {
        if chunk_size == 0 {
            return Err(JobError::Configuration("chunk size must be > 0".into()));
        }
        Ok(Self {
            source,
            sink,
            chain,
            chunk_size,
        })
    }

    /// Execute one run to its terminal status.
    ///
    /// Never returns an error: every failure is folded into
    /// [`RunStatus::Failed`] with its cause, after the sink has been
    /// released.
    pub fn run(&self, token: RunToken) -> RunStatus {
        let mut counts = RunCounts::default();
        tracing::info!("run {token} starting");

        let records = match self.source.open() {
            Ok(records) => records,
            Err(cause) => {
                tracing::warn!("run {token} failed to open source: {cause}");
                return RunStatus::Failed { counts, cause };
            }
        };

        let sink = match self.sink.open() {
            Ok(sink) => sink,
            Err(cause) => {
                tracing::warn!("run {token} failed to open sink: {cause}");
                return RunStatus::Failed { counts, cause };
            }
        };

        let mut writer = match ChunkWriter::new(sink, self.chunk_size) {
            Ok(writer) => writer,
            Err(cause) => return RunStatus::Failed { counts, cause },
        };

        let chain = (self.chain)();

        for record in records {
            counts.read += 1;
            match chain.apply(record) {
                FilterOutcome::Keep(kept) => {
                    counts.kept += 1;
                    if let Err(cause) = writer.add(kept) {
                        counts.written = writer.records_written();
                        tracing::warn!("run {token} aborted: {cause}");
                        return RunStatus::Failed { counts, cause };
                    }
                }
                // The chain already logged the drop with its reason.
                FilterOutcome::Drop(_) => {}
            }
        }

        counts.written = writer.records_written();
        match writer.finish() {
            Ok(totals) => {
                counts.written = totals.records_written;
                tracing::info!(
                    "run {token} completed: {counts} in {} chunks",
                    totals.chunks_committed
                );
                RunStatus::Completed(counts)
            }
            Err(cause) => {
                tracing::warn!("run {token} failed on final commit: {cause}");
                RunStatus::Failed { counts, cause }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{BirthdayFilter, DropReason, FilterStage, TransactionLimitFilter};
    use crate::io::RecordSink;
    use crate::record::Customer;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn customer(id: u64, transactions: u32) -> Customer {
        Customer {
            id,
            name: format!("c{id}"),
            birthday: NaiveDate::from_ymd_opt(1990, 8, 10).unwrap(),
            transactions,
        }
    }

    struct VecSource {
        records: Vec<Customer>,
    }

    impl RecordSource<Customer> for VecSource {
        fn open(&self) -> Result<crate::io::RecordIter<Customer>, JobError> {
            Ok(Box::new(self.records.clone().into_iter()))
        }
    }

    struct BrokenSource;

    impl RecordSource<Customer> for BrokenSource {
        fn open(&self) -> Result<crate::io::RecordIter<Customer>, JobError> {
            Err(JobError::SourceUnavailable("store offline".into()))
        }
    }

    /// Sink double collecting committed chunks of customer ids.
    struct CollectingSink {
        chunks: Arc<Mutex<Vec<Vec<u64>>>>,
        fail_on_commit: Option<u64>,
    }

    struct CollectingWriter {
        chunks: Arc<Mutex<Vec<Vec<u64>>>>,
        staged: Vec<u64>,
        fail_on_commit: Option<u64>,
        commits: u64,
    }

    impl SinkFactory<Customer> for CollectingSink {
        fn open(&self) -> Result<Box<dyn RecordSink<Customer>>, JobError> {
            Ok(Box::new(CollectingWriter {
                chunks: self.chunks.clone(),
                staged: Vec::new(),
                fail_on_commit: self.fail_on_commit,
                commits: 0,
            }))
        }
    }

    impl RecordSink<Customer> for CollectingWriter {
        fn append(&mut self, record: &Customer) -> Result<(), JobError> {
            self.staged.push(record.id);
            Ok(())
        }

        fn commit(&mut self) -> Result<(), JobError> {
            self.commits += 1;
            if self.fail_on_commit == Some(self.commits) {
                return Err(JobError::SinkWrite("disk full".into()));
            }
            self.chunks.lock().unwrap().push(std::mem::take(&mut self.staged));
            Ok(())
        }

        fn close(&mut self) -> Result<(), JobError> {
            Ok(())
        }
    }

    fn keep_all_chain() -> Arc<ChainFactory<Customer>> {
        Arc::new(|| FilterChain::new(vec![]))
    }

    fn report_chain(limit: u32) -> Arc<ChainFactory<Customer>> {
        Arc::new(move || {
            FilterChain::new(vec![
                Box::new(BirthdayFilter::new(|_| true)) as Box<dyn FilterStage<Customer>>,
                Box::new(TransactionLimitFilter::new(limit)),
            ])
        })
    }

    fn runner(
        records: Vec<Customer>,
        chain: Arc<ChainFactory<Customer>>,
        chunk_size: usize,
        fail_on_commit: Option<u64>,
    ) -> (ChunkedJobRunner<Customer>, Arc<Mutex<Vec<Vec<u64>>>>) {
        let chunks = Arc::new(Mutex::new(Vec::new()));
        let runner = ChunkedJobRunner::new(
            Arc::new(VecSource { records }),
            Arc::new(CollectingSink {
                chunks: chunks.clone(),
                fail_on_commit,
            }),
            chain,
            chunk_size,
        )
        .unwrap();
        (runner, chunks)
    }

    #[test]
    fn test_zero_chunk_size_rejected_at_construction() {
        let result = ChunkedJobRunner::new(
            Arc::new(VecSource { records: vec![] }) as Arc<dyn RecordSource<Customer>>,
            Arc::new(CollectingSink {
                chunks: Arc::new(Mutex::new(Vec::new())),
                fail_on_commit: None,
            }),
            keep_all_chain(),
            0,
        );
        assert!(matches!(result, Err(JobError::Configuration(_))));
    }

    #[test]
    fn test_report_scenario_two_chunks() {
        // 25 records, chunk size 20; eligibility keeps all, the threshold
        // stage drops the 3 records with transactions >= 5.
        let mut records: Vec<Customer> = (1..=22).map(|id| customer(id, 2)).collect();
        records.push(customer(23, 5));
        records.push(customer(24, 7));
        records.push(customer(25, 90));

        let (runner, chunks) = runner(records, report_chain(5), 20, None);
        let status = runner.run(RunToken::new(1));

        assert_eq!(
            status,
            RunStatus::Completed(RunCounts {
                read: 25,
                kept: 22,
                written: 22,
            })
        );

        let chunks = chunks.lock().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 20);
        assert_eq!(chunks[1].len(), 2);

        // Output order equals the kept subsequence of input order.
        let written: Vec<u64> = chunks.iter().flatten().copied().collect();
        assert_eq!(written, (1..=22).collect::<Vec<u64>>());

        // At most once per run.
        let mut deduped = written.clone();
        deduped.dedup();
        assert_eq!(deduped, written);
    }

    #[test]
    fn test_all_records_dropped() {
        let records: Vec<Customer> = (1..=3).map(|id| customer(id, 50)).collect();
        let (runner, chunks) = runner(records, report_chain(5), 20, None);

        let status = runner.run(RunToken::new(1));
        assert_eq!(
            status,
            RunStatus::Completed(RunCounts {
                read: 3,
                kept: 0,
                written: 0,
            })
        );
        assert!(chunks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_source_completes_with_zero_counts() {
        let (runner, chunks) = runner(vec![], keep_all_chain(), 20, None);
        let status = runner.run(RunToken::new(1));
        assert_eq!(status, RunStatus::Completed(RunCounts::default()));
        assert!(chunks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_source_unavailable_fails_run() {
        let runner = ChunkedJobRunner::new(
            Arc::new(BrokenSource) as Arc<dyn RecordSource<Customer>>,
            Arc::new(CollectingSink {
                chunks: Arc::new(Mutex::new(Vec::new())),
                fail_on_commit: None,
            }),
            keep_all_chain(),
            20,
        )
        .unwrap();

        match runner.run(RunToken::new(1)) {
            RunStatus::Failed { counts, cause } => {
                assert_eq!(counts, RunCounts::default());
                assert!(matches!(cause, JobError::SourceUnavailable(_)));
            }
            other => panic!("expected failure, got {other}"),
        }
    }

    #[test]
    fn test_sink_failure_preserves_prior_chunks() {
        // Chunk size 2 over 6 records; the second commit fails.
        let records: Vec<Customer> = (1..=6).map(|id| customer(id, 0)).collect();
        let (runner, chunks) = runner(records, keep_all_chain(), 2, Some(2));

        match runner.run(RunToken::new(1)) {
            RunStatus::Failed { counts, cause } => {
                assert!(matches!(cause, JobError::SinkWrite(_)));
                assert_eq!(counts.read, 4); // failed while committing record 4's chunk
                assert_eq!(counts.kept, 4);
                assert_eq!(counts.written, 2); // only chunk 1 landed
            }
            other => panic!("expected failure, got {other}"),
        }
        assert_eq!(*chunks.lock().unwrap(), vec![vec![1, 2]]);
    }

    #[test]
    fn test_trailing_commit_failure() {
        let records: Vec<Customer> = (1..=3).map(|id| customer(id, 0)).collect();
        let (runner, chunks) = runner(records, keep_all_chain(), 20, Some(1));

        match runner.run(RunToken::new(1)) {
            RunStatus::Failed { counts, cause } => {
                assert!(matches!(cause, JobError::SinkWrite(_)));
                assert_eq!(counts.read, 3);
                assert_eq!(counts.kept, 3);
                assert_eq!(counts.written, 0);
            }
            other => panic!("expected failure, got {other}"),
        }
        assert!(chunks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_status_display() {
        let completed = RunStatus::Completed(RunCounts {
            read: 25,
            kept: 22,
            written: 22,
        });
        assert_eq!(completed.to_string(), "COMPLETED (read=25 kept=22 written=22)");
        assert!(completed.is_completed());

        let failed = RunStatus::Failed {
            counts: RunCounts::default(),
            cause: JobError::SinkWrite("disk full".into()),
        };
        assert!(failed.is_failed());
        assert!(failed.to_string().contains("FAILED"));
        assert!(failed.to_string().contains("disk full"));
    }
}

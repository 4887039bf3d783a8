//! Fixed-interval job scheduling and run bookkeeping.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::error::JobError;
use crate::pipeline::runner::{ChunkedJobRunner, RunStatus};
use crate::record::Record;

/// Opaque identifier minted once per scheduled invocation.
///
/// Tokens only distinguish runs for bookkeeping; their numeric value is never
/// interpreted. Unique for the lifetime of the scheduler that minted them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunToken(u64);

impl RunToken {
    /// Wrap a raw token value. The scheduler mints these from a counter;
    /// callers driving a runner directly pick their own.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw token value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Append-only history of run outcomes, keyed by job name.
///
/// Exists for operational inspection and tests; the engine never consults it
/// when deciding how to execute a run.
#[derive(Debug, Default)]
pub struct ExecutionRegistry {
    history: Mutex<HashMap<String, Vec<(RunToken, RunStatus)>>>,
}

impl ExecutionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a terminal run outcome for a job.
    pub fn record(&self, job: &str, token: RunToken, status: RunStatus) {
        let mut history = self.lock();
        history.entry(job.to_string()).or_default().push((token, status));
    }

    /// The ordered run history of a job.
    pub fn history(&self, job: &str) -> Vec<(RunToken, RunStatus)> {
        self.lock().get(job).cloned().unwrap_or_default()
    }

    /// Number of recorded runs for a job.
    pub fn run_count(&self, job: &str) -> usize {
        self.lock().get(job).map_or(0, Vec::len)
    }

    /// Names of every job with at least one recorded run.
    pub fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<(RunToken, RunStatus)>>> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Fires job runs on a fixed interval.
///
/// Each tick mints a fresh [`RunToken`], executes the runner to completion on
/// the blocking pool, and records the status in the registry before awaiting
/// the next tick. Because the loop awaits each run, runs are serialized by
/// construction: a run longer than the interval delays the next tick, it
/// never overlaps it. The first run fires immediately.
pub struct JobScheduler<R> {
    job_name: String,
    interval: Duration,
    runner: Arc<ChunkedJobRunner<R>>,
    registry: Arc<ExecutionRegistry>,
    next_token: AtomicU64,
}

impl<R: Record> JobScheduler<R> {
    /// Wire a scheduler. Fails fast on a zero interval.
    pub fn new(
        job_name: impl Into<String>,
        interval: Duration,
        runner: Arc<ChunkedJobRunner<R>>,
        registry: Arc<ExecutionRegistry>,
    ) -> Result<Self, JobError> {
        if interval.is_zero() {
            return Err(JobError::Configuration("tick interval must be > 0".into()));
        }
        Ok(Self {
            job_name: job_name.into(),
            interval,
            runner,
            registry,
            next_token: AtomicU64::new(0),
        })
    }

    /// The registry this scheduler appends to.
    pub fn registry(&self) -> Arc<ExecutionRegistry> {
        self.registry.clone()
    }

    /// Run the schedule forever.
    pub async fn run(&self) -> Result<()> {
        let mut ticker = self.ticker();
        loop {
            ticker.tick().await;
            self.fire().await?;
        }
    }

    /// Run exactly `ticks` scheduled invocations, then return.
    pub async fn run_ticks(&self, ticks: u64) -> Result<()> {
        let mut ticker = self.ticker();
        for _ in 0..ticks {
            ticker.tick().await;
            self.fire().await?;
        }
        Ok(())
    }

    /// Execute one scheduled run and record its terminal status.
    async fn fire(&self) -> Result<RunStatus> {
        let token = self.mint_token();
        let runner = self.runner.clone();

        // Runs are blocking file work; keep them off the timer's thread.
        let status = tokio::task::spawn_blocking(move || runner.run(token))
            .await
            .context("job run panicked")?;

        tracing::info!("job '{}' run {} finished: {}", self.job_name, token, status);
        self.registry.record(&self.job_name, token, status.clone());
        Ok(status)
    }

    fn ticker(&self) -> tokio::time::Interval {
        let mut ticker = tokio::time::interval(self.interval);
        // A slow run delays the following tick instead of bursting.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    fn mint_token(&self) -> RunToken {
        RunToken::new(self.next_token.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

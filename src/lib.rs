//! Customer Report Batch Engine
//!
//! A scheduled, chunk-oriented batch job: on a fixed interval, decode a
//! bounded set of customer records, push each one through an ordered chain of
//! filter stages, and commit the survivors to a report file in fixed-size
//! chunks.
//!
//! # Architecture
//!
//! - **io**: record sources (one-shot JSON decode) and sinks (line-oriented
//!   report file with per-chunk commit)
//! - **filter**: the stage contract, the ordered short-circuiting chain, and
//!   the built-in birthday/transaction stages
//! - **pipeline**: the chunked run loop, the chunk writer, the scheduler,
//!   and the execution registry
//!
//! # Usage
//!
//! ```no_run
//! use customer_report::{run_scheduler, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file(&"config.yaml".into())?;
//!     run_scheduler(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod io;
pub mod pipeline;
pub mod record;

pub use config::{BirthdayWindow, Config};
pub use error::JobError;
pub use filter::{BirthdayFilter, DropReason, FilterChain, FilterOutcome, FilterStage, TransactionLimitFilter};
pub use io::{JsonFileSource, LineFileSink, RecordSink, RecordSource, SinkFactory};
pub use pipeline::{
    ChainFactory, ChunkedJobRunner, ExecutionRegistry, JobScheduler, RunCounts, RunStatus,
    RunToken,
};
pub use record::{seed_customers, Customer, Record};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::sync::Arc;

/// Build the report filter chain for one run.
///
/// The birthday window is evaluated against `reference` so a long-running
/// scheduler tracks the calendar instead of freezing the date it booted on.
pub fn build_chain(config: &Config, reference: NaiveDate) -> FilterChain<Customer> {
    FilterChain::new(vec![
        Box::new(BirthdayFilter::from_window(
            &config.filters.birthday_window,
            reference,
        )) as Box<dyn FilterStage<Customer>>,
        Box::new(TransactionLimitFilter::new(config.filters.transaction_limit)),
    ])
}

/// Wire a runner for the configured job.
pub fn build_runner(config: &Config) -> Result<Arc<ChunkedJobRunner<Customer>>, JobError> {
    config.validate()?;

    let source: Arc<dyn RecordSource<Customer>> =
        Arc::new(JsonFileSource::<Customer>::new(config.input.path.clone()));
    let sink: Arc<dyn SinkFactory<Customer>> =
        Arc::new(LineFileSink::new(config.output.path.clone()));

    let chain_config = config.clone();
    let chain = Arc::new(move || build_chain(&chain_config, Local::now().date_naive()));

    let runner = ChunkedJobRunner::new(source, sink, chain, config.job.chunk_size)?;
    Ok(Arc::new(runner))
}

/// Execute a single run immediately, outside any schedule.
pub fn run_once(config: &Config) -> Result<RunStatus> {
    let runner = build_runner(config)?;
    Ok(runner.run(RunToken::new(1)))
}

/// Run the scheduled job forever with the given configuration.
pub async fn run_scheduler(config: Config) -> Result<()> {
    config.validate()?;

    tracing::info!(
        "Starting job '{}': every {}s, chunk size {}, {} -> {}",
        config.job.name,
        config.job.interval_secs,
        config.job.chunk_size,
        config.input.path.display(),
        config.output.path.display()
    );

    let runner = build_runner(&config)?;
    let registry = Arc::new(ExecutionRegistry::new());
    let scheduler = JobScheduler::new(
        config.job.name.clone(),
        config.interval(),
        runner,
        registry,
    )?;

    scheduler.run().await
}

/// Build a Tokio runtime with the specified configuration.
pub fn build_runtime(worker_threads: Option<usize>) -> Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();

    if let Some(threads) = worker_threads {
        builder.worker_threads(threads);
    }

    builder.enable_all();

    Ok(builder.build()?)
}

//! Chunk-oriented execution engine.
//!
//! ```text
//! ┌───────────┐   tick   ┌──────────────────┐  per record  ┌─────────────┐
//! │ Scheduler │─────────▶│ ChunkedJobRunner │─────────────▶│ FilterChain │
//! └───────────┘          └──────────────────┘              └─────────────┘
//!       │ records status        │ kept records
//!       ▼                       ▼
//! ┌───────────────────┐   ┌─────────────┐  chunk_size  ┌──────┐
//! │ ExecutionRegistry │   │ ChunkWriter │─────────────▶│ sink │
//! └───────────────────┘   └─────────────┘    commit    └──────┘
//! ```
//!
//! One run is strictly sequential (read, filter, buffer, flush), so output
//! order equals filtered input order and nothing inside a run needs locking.
//! The scheduler serializes runs by construction.

mod chunk_writer;
mod runner;
mod scheduler;

pub use chunk_writer::{ChunkWriter, WriteTotals};
pub use runner::{ChainFactory, ChunkedJobRunner, RunCounts, RunStatus};
pub use scheduler::{ExecutionRegistry, JobScheduler, RunToken};

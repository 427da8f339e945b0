//! Batch orchestration for REVLENS.
//!
//! The engine walks a batch of rows through cache lookup and remote
//! enrichment under a bounded worker pool, producing exactly one result
//! per input row regardless of individual failures.

pub mod engine;
pub mod pool;

pub use engine::{EnrichmentEngine, NoProgress, ProgressSink};
pub use pool::{CancelToken, WorkerPool};

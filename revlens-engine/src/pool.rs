//! Bounded worker pool with cooperative cancellation.
//!
//! Concurrency is capped by a semaphore rather than a fixed thread
//! count; tasks are indexed so results come back in submission order no
//! matter how execution interleaves. A panicking task poisons only its
//! own slot.

use futures_util::FutureExt;
use revlens_core::EngineError;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Shared cancellation flag for a running batch.
///
/// Cancellation is cooperative and forward-looking: tasks not yet
/// started return [`EngineError::Cancelled`], tasks already past the
/// gate run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Semaphore-bounded task runner.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl WorkerPool {
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run every task with at most `max_concurrency` in flight.
    ///
    /// The output vector is positionally aligned with `tasks`: slot `i`
    /// holds task `i`'s value, or the reason it produced none.
    pub async fn run<T, Fut>(
        &self,
        tasks: Vec<Fut>,
        cancel: &CancelToken,
    ) -> Vec<Result<T, EngineError>>
    where
        T: Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut results: Vec<Result<T, EngineError>> = tasks
            .iter()
            .map(|_| Err(EngineError::TaskPanicked))
            .collect();

        let mut join_set = JoinSet::new();
        for (index, task) in tasks.into_iter().enumerate() {
            if cancel.is_cancelled() {
                results[index] = Err(EngineError::Cancelled);
                continue;
            }
            let semaphore = Arc::clone(&self.semaphore);
            let cancel = cancel.clone();
            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, Err(EngineError::Cancelled));
                };
                // Tasks queued behind the semaphore observe a cancel that
                // arrived while they waited.
                if cancel.is_cancelled() {
                    return (index, Err(EngineError::Cancelled));
                }
                match AssertUnwindSafe(task).catch_unwind().await {
                    Ok(value) => (index, Ok(value)),
                    Err(_) => (index, Err(EngineError::TaskPanicked)),
                }
            });
        }

        while let Some(joined) = join_set.join_next().await {
            // A join error means the task panicked outside catch_unwind or
            // was aborted; its slot keeps the TaskPanicked prefill.
            if let Ok((index, result)) = joined {
                results[index] = result;
            }
        }
        results
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

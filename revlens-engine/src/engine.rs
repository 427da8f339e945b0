//! The cache-then-remote enrichment loop over a batch of rows.

use crate::pool::{CancelToken, WorkerPool};
use revlens_cache::EnrichmentCache;
use revlens_core::{
    BatchSummary, EngineConfig, EngineError, EnrichmentRequest, EnrichmentResult, Outcome,
};
use revlens_remote::RemoteOperation;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Receives progress ticks while a batch runs. Implementations must be
/// cheap; they are called from worker tasks.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize, cache_hits: usize);
}

/// Sink for callers that do not track progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _completed: usize, _total: usize, _cache_hits: usize) {}
}

/// Drives one enrichment operation over batches of rows.
///
/// Per row: an empty text short-circuits to an empty success, a cache
/// hit skips the backend entirely, anything else goes to the remote
/// operation and the produced value is written back to the cache.
/// Exactly one [`EnrichmentResult`] comes back per request, in request
/// order.
pub struct EnrichmentEngine {
    config: EngineConfig,
    pool: WorkerPool,
}

impl EnrichmentEngine {
    pub fn new(config: EngineConfig) -> Self {
        let pool = WorkerPool::new(config.concurrency);
        Self { config, pool }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn run(
        &self,
        requests: Vec<EnrichmentRequest>,
        operation: Arc<dyn RemoteOperation>,
        cache: Arc<dyn EnrichmentCache>,
        progress: Arc<dyn ProgressSink>,
        cancel: &CancelToken,
    ) -> Vec<EnrichmentResult> {
        let total = requests.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let cache_hits = Arc::new(AtomicUsize::new(0));
        let delay = self.config.inter_call_delay;

        let row_ids: Vec<_> = requests.iter().map(|r| r.row_id).collect();
        let tasks: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let operation = Arc::clone(&operation);
                let cache = Arc::clone(&cache);
                let progress = Arc::clone(&progress);
                let completed = Arc::clone(&completed);
                let cache_hits = Arc::clone(&cache_hits);
                async move {
                    let outcome =
                        enrich_one(&*operation, &*cache, &request.text, delay, &cache_hits).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.on_progress(done, total, cache_hits.load(Ordering::SeqCst));
                    EnrichmentResult {
                        row_id: request.row_id,
                        outcome,
                    }
                }
            })
            .collect();

        let slots = self.pool.run(tasks, cancel).await;
        let results: Vec<_> = slots
            .into_iter()
            .zip(row_ids)
            .map(|(slot, row_id)| match slot {
                Ok(result) => result,
                Err(EngineError::Cancelled) => EnrichmentResult {
                    row_id,
                    outcome: Outcome::Failure("cancelled before start".to_string()),
                },
                Err(EngineError::TaskPanicked) => EnrichmentResult {
                    row_id,
                    outcome: Outcome::Failure("worker panicked".to_string()),
                },
            })
            .collect();

        let summary = BatchSummary::from_results(&results);
        tracing::info!(
            operation = operation.kind().as_str(),
            total = summary.total,
            succeeded = summary.succeeded,
            cache_hits = summary.cache_hits,
            failed = summary.failed,
            "batch complete"
        );
        results
    }
}

async fn enrich_one(
    operation: &dyn RemoteOperation,
    cache: &dyn EnrichmentCache,
    text: &str,
    delay: Duration,
    cache_hits: &AtomicUsize,
) -> Outcome {
    // Blank rows are vacuously done; no key, no backend call.
    if text.trim().is_empty() {
        return Outcome::Success(String::new());
    }

    let key = operation.cache_key(text);
    if let Some(value) = cache.get(&key) {
        cache_hits.fetch_add(1, Ordering::SeqCst);
        return Outcome::CacheHit(value);
    }

    let result = operation.enrich(text).await;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    match result {
        Ok(value) => {
            cache.set(&key, &value);
            Outcome::Success(value)
        }
        Err(reason) => Outcome::Failure(reason),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use revlens_cache::VolatileCache;
    use revlens_core::{fingerprint, CacheKey, OperationKind, OperationParams, TranslateParams};
    use std::sync::Mutex;

    /// Echoes the text back with a marker, counting backend calls and
    /// failing rows whose text contains "poison".
    struct EchoOperation {
        calls: AtomicUsize,
        panic_on: Option<String>,
    }

    impl EchoOperation {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                panic_on: None,
            }
        }

        fn panicking_on(text: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                panic_on: Some(text.to_string()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn params() -> OperationParams {
            OperationParams::Translate(TranslateParams::new("echo", "en", "zh"))
        }
    }

    #[async_trait]
    impl RemoteOperation for EchoOperation {
        fn kind(&self) -> OperationKind {
            OperationKind::Translate
        }

        fn cache_key(&self, text: &str) -> CacheKey {
            fingerprint(text, &Self::params())
        }

        async fn enrich(&self, text: &str) -> Result<String, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(bad) = &self.panic_on {
                if text.contains(bad.as_str()) {
                    panic!("poisoned row");
                }
            }
            if text.contains("poison") {
                Err(format!("[error: {}]", text))
            } else {
                Ok(format!("echo:{}", text))
            }
        }
    }

    struct RecordingProgress {
        ticks: Mutex<Vec<(usize, usize, usize)>>,
    }

    impl RecordingProgress {
        fn new() -> Self {
            Self {
                ticks: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProgressSink for RecordingProgress {
        fn on_progress(&self, completed: usize, total: usize, cache_hits: usize) {
            if let Ok(mut ticks) = self.ticks.lock() {
                ticks.push((completed, total, cache_hits));
            }
        }
    }

    fn requests(texts: &[&str]) -> Vec<EnrichmentRequest> {
        texts
            .iter()
            .enumerate()
            .map(|(n, text)| EnrichmentRequest::new(n as i64, *text))
            .collect()
    }

    fn engine(concurrency: usize) -> EnrichmentEngine {
        EnrichmentEngine::new(EngineConfig::new().with_concurrency(concurrency))
    }

    #[tokio::test]
    async fn test_one_result_per_request_in_order() {
        let results = engine(4)
            .run(
                requests(&["a", "b", "c", "d", "e"]),
                Arc::new(EchoOperation::new()),
                Arc::new(VolatileCache::with_defaults()),
                Arc::new(NoProgress),
                &CancelToken::new(),
            )
            .await;
        assert_eq!(results.len(), 5);
        for (n, result) in results.iter().enumerate() {
            assert_eq!(result.row_id, n as i64);
            assert!(result.outcome.is_success());
        }
        assert_eq!(results[2].outcome.text(), Some("echo:c"));
    }

    #[tokio::test]
    async fn test_failed_row_does_not_stop_the_batch() {
        let results = engine(2)
            .run(
                requests(&["ok1", "poison here", "ok2"]),
                Arc::new(EchoOperation::new()),
                Arc::new(VolatileCache::with_defaults()),
                Arc::new(NoProgress),
                &CancelToken::new(),
            )
            .await;
        assert!(results[0].outcome.is_success());
        assert!(results[1].outcome.is_failure());
        assert!(results[2].outcome.is_success());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = Arc::new(VolatileCache::with_defaults());
        let operation = Arc::new(EchoOperation::new());
        for _ in 0..2 {
            engine(1)
                .run(
                    requests(&["poison"]),
                    operation.clone(),
                    cache.clone(),
                    Arc::new(NoProgress),
                    &CancelToken::new(),
                )
                .await;
        }
        // Second run called the backend again instead of hitting a cache.
        assert_eq!(operation.call_count(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_texts_hit_cache_when_serial() {
        let cache = Arc::new(VolatileCache::with_defaults());
        let operation = Arc::new(EchoOperation::new());
        let results = engine(1)
            .run(
                requests(&["same", "same", "same"]),
                operation.clone(),
                cache.clone(),
                Arc::new(NoProgress),
                &CancelToken::new(),
            )
            .await;
        assert_eq!(operation.call_count(), 1);
        assert!(results[0].outcome.is_success());
        assert!(results[1].outcome.is_cache_hit());
        assert!(results[2].outcome.is_cache_hit());
        assert_eq!(results[2].outcome.text(), Some("echo:same"));
    }

    #[tokio::test]
    async fn test_empty_text_short_circuits() {
        let operation = Arc::new(EchoOperation::new());
        let results = engine(2)
            .run(
                requests(&["", "   ", "real"]),
                operation.clone(),
                Arc::new(VolatileCache::with_defaults()),
                Arc::new(NoProgress),
                &CancelToken::new(),
            )
            .await;
        assert_eq!(results[0].outcome.text(), Some(""));
        assert_eq!(results[1].outcome.text(), Some(""));
        assert_eq!(results[2].outcome.text(), Some("echo:real"));
        // Only the non-blank row reached the backend.
        assert_eq!(operation.call_count(), 1);
    }

    #[tokio::test]
    async fn test_progress_reaches_total() {
        let progress = Arc::new(RecordingProgress::new());
        engine(3)
            .run(
                requests(&["a", "b", "a", "c"]),
                Arc::new(EchoOperation::new()),
                Arc::new(VolatileCache::with_defaults()),
                progress.clone(),
                &CancelToken::new(),
            )
            .await;
        let ticks = progress.ticks.lock().unwrap();
        assert_eq!(ticks.len(), 4);
        assert!(ticks.iter().any(|&(done, total, _)| done == total));
        assert!(ticks.iter().all(|&(_, total, _)| total == 4));
    }

    #[tokio::test]
    async fn test_cancelled_batch_reports_failures() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let operation = Arc::new(EchoOperation::new());
        let results = engine(2)
            .run(
                requests(&["a", "b"]),
                operation.clone(),
                Arc::new(VolatileCache::with_defaults()),
                Arc::new(NoProgress),
                &cancel,
            )
            .await;
        assert_eq!(results.len(), 2);
        for result in &results {
            match &result.outcome {
                Outcome::Failure(reason) => assert!(reason.contains("cancelled")),
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        assert_eq!(operation.call_count(), 0);
    }

    #[tokio::test]
    async fn test_panicked_worker_reports_failure() {
        let results = engine(2)
            .run(
                requests(&["fine", "kaboom", "fine too"]),
                Arc::new(EchoOperation::panicking_on("kaboom")),
                Arc::new(VolatileCache::with_defaults()),
                Arc::new(NoProgress),
                &CancelToken::new(),
            )
            .await;
        assert!(results[0].outcome.is_success());
        match &results[1].outcome {
            Outcome::Failure(reason) => assert!(reason.contains("panicked")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(results[2].outcome.is_success());
    }

    #[tokio::test]
    async fn test_inter_call_delay_paces_the_batch() {
        let engine = EnrichmentEngine::new(EngineConfig::serial_with_delay(
            Duration::from_millis(15),
        ));
        let start = std::time::Instant::now();
        engine
            .run(
                requests(&["a", "b", "c"]),
                Arc::new(EchoOperation::new()),
                Arc::new(VolatileCache::with_defaults()),
                Arc::new(NoProgress),
                &CancelToken::new(),
            )
            .await;
        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}

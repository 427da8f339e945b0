//! The seam between the batch engine and the remote backends.

use async_trait::async_trait;
use revlens_core::{CacheKey, OperationKind};

/// A remote enrichment applied to one row of text.
///
/// Implementations own their backend client, retry policy and any text
/// normalization; the engine only sees three capabilities: identify the
/// operation, derive a content-addressed cache key for a text, and run
/// the enrichment.
///
/// `enrich` returns `Err` with a human-readable sentinel string when the
/// backend fails past retries. The engine records that string as the
/// row's failure reason and keeps going; one bad row never aborts a
/// batch.
#[async_trait]
pub trait RemoteOperation: Send + Sync {
    /// Which operation family this is.
    fn kind(&self) -> OperationKind;

    /// Cache key for this operation applied to `text`.
    ///
    /// Must be deterministic and must incorporate every parameter that
    /// changes the output, so that a parameter change is a cache miss
    /// rather than a stale hit.
    fn cache_key(&self, text: &str) -> CacheKey;

    /// Run the enrichment against the remote backend.
    async fn enrich(&self, text: &str) -> Result<String, String>;
}

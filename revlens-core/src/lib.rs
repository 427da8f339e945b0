//! REVLENS Core - Enrichment Data Types
//!
//! Pure data structures with no behavior beyond content fingerprinting.
//! All other crates depend on this. This crate contains ONLY data types
//! and the deterministic hashing that identifies an enrichment - no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod config;
pub mod error;

pub use config::{
    DurableCacheConfig, EngineConfig, RetryConfig, RevlensConfig, VolatileCacheConfig,
};
pub use error::{
    CacheError, ConfigError, EngineError, RemoteError, RevlensError, RevlensResult,
};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Row identifier supplied by the caller.
/// Used only to re-associate results with inputs; no ordering is implied.
pub type RowId = i64;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Content-addressed cache key: lowercase hex encoding of a SHA-256 digest
/// over (text, operation kind, operation parameters).
///
/// Safe to use as a filename; two semantically distinct operations on the
/// same text never collide because every key field is length-prefixed
/// before hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an already-computed key. Normal construction goes through
    /// [`fingerprint`]; this exists for tests and for re-reading persisted
    /// key material.
    pub fn new(hex_digest: impl Into<String>) -> Self {
        Self(hex_digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Discriminator for the two enrichment operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Machine translation of the row text.
    Translate,
    /// AI-generated label or conclusion for the row text.
    AiAnnotate,
}

impl OperationKind {
    /// Stable string form, hashed into the cache key and used as the
    /// durable cache namespace.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Translate => "translate",
            OperationKind::AiAnnotate => "ai_annotate",
        }
    }
}

/// Parameters identifying a translation operation.
/// Any change to any field changes the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateParams {
    /// Backend engine identifier (e.g. "google", "tencent").
    pub engine: String,
    /// Source language code (e.g. "en").
    pub source_lang: String,
    /// Target language code (e.g. "zh-CN").
    pub target_lang: String,
}

impl TranslateParams {
    pub fn new(
        engine: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            engine: engine.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }
}

/// Parameters identifying an AI annotation operation.
///
/// The API credential is deliberately NOT part of these params: it belongs
/// to the client, and hashing it would fragment the cache across key
/// rotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotateParams {
    /// Model identifier (e.g. "gpt-3.5-turbo", "deepseek-chat").
    pub model: String,
    /// Prompt template with optional `{text}` / `{Content}` placeholders.
    pub prompt_template: String,
    /// Name of the source field the placeholder binds to.
    pub source_field: String,
}

impl AnnotateParams {
    pub fn new(
        model: impl Into<String>,
        prompt_template: impl Into<String>,
        source_field: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            prompt_template: prompt_template.into(),
            source_field: source_field.into(),
        }
    }
}

/// Tagged parameter set for either operation variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationParams {
    Translate(TranslateParams),
    AiAnnotate(AnnotateParams),
}

impl OperationParams {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationParams::Translate(_) => OperationKind::Translate,
            OperationParams::AiAnnotate(_) => OperationKind::AiAnnotate,
        }
    }

    /// The parameter fields that participate in the fingerprint, in a
    /// fixed order.
    fn key_fields(&self) -> Vec<&str> {
        match self {
            OperationParams::Translate(p) => {
                vec![&p.engine, &p.source_lang, &p.target_lang]
            }
            OperationParams::AiAnnotate(p) => {
                vec![&p.model, &p.prompt_template, &p.source_field]
            }
        }
    }
}

// ============================================================================
// CONTENT FINGERPRINT
// ============================================================================

/// Compute the content-addressed cache key for (text, operation, params).
///
/// Deterministic across calls and process restarts. Each field is
/// length-prefixed before being fed to the hasher so that no two distinct
/// field sequences can produce the same byte stream.
pub fn fingerprint(text: &str, params: &OperationParams) -> CacheKey {
    let mut hasher = Sha256::new();
    hash_field(&mut hasher, params.kind().as_str().as_bytes());
    for field in params.key_fields() {
        hash_field(&mut hasher, field.as_bytes());
    }
    hash_field(&mut hasher, text.as_bytes());
    CacheKey(hex::encode(hasher.finalize()))
}

fn hash_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

// ============================================================================
// REQUESTS AND RESULTS
// ============================================================================

/// The unit of work submitted to the enrichment engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRequest {
    pub row_id: RowId,
    pub text: String,
}

impl EnrichmentRequest {
    pub fn new(row_id: RowId, text: impl Into<String>) -> Self {
        Self {
            row_id,
            text: text.into(),
        }
    }
}

/// Terminal outcome of one enrichment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Remote computation succeeded; value was stored in the cache tier.
    Success(String),
    /// Value was served from a cache tier; no remote call was made.
    CacheHit(String),
    /// Remote computation failed after exhausting retries.
    /// Carries a human-readable reason for inline triage.
    Failure(String),
}

impl Outcome {
    /// The derived text, if the request produced one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Outcome::Success(t) | Outcome::CacheHit(t) => Some(t),
            Outcome::Failure(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_cache_hit(&self) -> bool {
        matches!(self, Outcome::CacheHit(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }
}

/// Exactly one result is produced per [`EnrichmentRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub row_id: RowId,
    pub outcome: Outcome,
}

/// Aggregate counters for a completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub cache_hits: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[EnrichmentResult]) -> Self {
        let mut summary = BatchSummary {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            match result.outcome {
                Outcome::Success(_) => summary.succeeded += 1,
                Outcome::CacheHit(_) => summary.cache_hits += 1,
                Outcome::Failure(_) => summary.failed += 1,
            }
        }
        summary
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Fingerprint is stable for identical inputs.
        #[test]
        fn prop_fingerprint_stable(text in ".{0,200}", engine in "[a-z]{1,10}") {
            let params =
                OperationParams::Translate(TranslateParams::new(engine, "en", "zh-CN"));
            prop_assert_eq!(fingerprint(&text, &params), fingerprint(&text, &params));
        }

        /// Differing texts produce differing keys.
        #[test]
        fn prop_fingerprint_distinct_texts(a in ".{0,100}", b in ".{0,100}") {
            prop_assume!(a != b);
            let params =
                OperationParams::Translate(TranslateParams::new("google", "en", "zh-CN"));
            prop_assert_ne!(fingerprint(&a, &params), fingerprint(&b, &params));
        }

        /// Differing prompt templates produce differing keys for the same text.
        #[test]
        fn prop_fingerprint_distinct_prompts(p1 in ".{1,80}", p2 in ".{1,80}") {
            prop_assume!(p1 != p2);
            let a = OperationParams::AiAnnotate(AnnotateParams::new("m", p1, "Content"));
            let b = OperationParams::AiAnnotate(AnnotateParams::new("m", p2, "Content"));
            prop_assert_ne!(fingerprint("text", &a), fingerprint("text", &b));
        }
    }
}

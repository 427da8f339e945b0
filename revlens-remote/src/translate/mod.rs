//! Machine translation of review text.
//!
//! The operation pipeline around each backend call:
//! normalize, protect technical terms, chunk, translate chunk by chunk
//! with retries, reassemble, restore terms, clean punctuation seams.

mod client;
mod types;

pub use client::{HttpTranslateClient, TranslateClient};
pub use types::{TranslateRequest, TranslateResponse};

use crate::chunk;
use crate::normalize;
use crate::operation::RemoteOperation;
use crate::retry::{retry, RetryPolicy};
use async_trait::async_trait;
use revlens_core::{fingerprint, CacheKey, OperationKind, OperationParams, TranslateParams};
use std::sync::Arc;

/// How much of the source text a failure sentinel quotes back.
const SENTINEL_PREFIX_CHARS: usize = 50;

/// Translation as a cacheable remote operation.
pub struct TranslateOperation {
    client: Arc<dyn TranslateClient>,
    params: TranslateParams,
    retry: RetryPolicy,
    max_chunk_chars: usize,
}

impl TranslateOperation {
    pub fn new(client: Arc<dyn TranslateClient>, params: TranslateParams) -> Self {
        Self {
            client,
            params,
            retry: RetryPolicy::default(),
            max_chunk_chars: chunk::MAX_CHUNK_CHARS,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars.max(1);
        self
    }

    pub fn params(&self) -> &TranslateParams {
        &self.params
    }

    /// Failure marker embedding the start of the untranslated text, so a
    /// reader of the output column can tell which row failed and why the
    /// value is not a translation.
    fn failure_sentinel(text: &str) -> String {
        let prefix: String = text.chars().take(SENTINEL_PREFIX_CHARS).collect();
        format!("[translation error: {}...]", prefix)
    }
}

#[async_trait]
impl RemoteOperation for TranslateOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::Translate
    }

    /// Keyed over the normalized text: two raw texts that normalize to
    /// the same string share one cache entry and one backend call.
    fn cache_key(&self, text: &str) -> CacheKey {
        let normalized = normalize::preprocess(text);
        fingerprint(&normalized, &OperationParams::Translate(self.params.clone()))
    }

    async fn enrich(&self, text: &str) -> Result<String, String> {
        let normalized = normalize::preprocess(text);
        let protected = normalize::protect_terms(&normalized);
        let chunks = chunk::split_for_translation(&protected, self.max_chunk_chars);

        let mut translated = Vec::with_capacity(chunks.len());
        for part in &chunks {
            let result = retry(&self.retry, self.client.engine(), || {
                self.client
                    .translate(part, &self.params.source_lang, &self.params.target_lang)
            })
            .await;
            match result {
                Ok(translation) => translated.push(translation),
                Err(e) => {
                    tracing::warn!(
                        engine = self.client.engine(),
                        chunks = chunks.len(),
                        error = %e,
                        "translation failed"
                    );
                    return Err(Self::failure_sentinel(text));
                }
            }
        }

        let joined = chunk::reassemble(&translated);
        let restored = normalize::restore_terms(&joined);
        Ok(normalize::postprocess(&restored))
    }
}

// =============================================================================
// TESTS
// =============================================================================

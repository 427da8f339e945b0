//! AI labeling of review text through a chat completion backend.

mod client;
mod types;

pub use client::{ChatClient, OpenAiChatClient};
pub use types::{ChatMessage, ChatRequest, ChatResponse};

use crate::operation::RemoteOperation;
use crate::retry::{retry, RetryPolicy};
use async_trait::async_trait;
use revlens_core::{fingerprint, AnnotateParams, CacheKey, OperationKind, OperationParams, RemoteError};
use std::sync::Arc;

/// Substitute the row text into a prompt template.
///
/// `{text}` is the canonical placeholder; `{Content}` is accepted for
/// templates written against the source column name. A template with
/// neither is sent unmodified.
pub fn render_prompt(template: &str, text: &str) -> String {
    if template.contains("{text}") {
        template.replace("{text}", text)
    } else if template.contains("{Content}") {
        template.replace("{Content}", text)
    } else {
        template.to_string()
    }
}

/// AI labeling as a cacheable remote operation.
pub struct AnnotateOperation {
    client: Arc<dyn ChatClient>,
    params: AnnotateParams,
    retry: RetryPolicy,
}

impl AnnotateOperation {
    pub fn new(client: Arc<dyn ChatClient>, params: AnnotateParams) -> Self {
        Self {
            client,
            params,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn params(&self) -> &AnnotateParams {
        &self.params
    }

    /// One cheap round trip to verify endpoint, key and model before a
    /// batch commits to thousands of calls.
    pub async fn check_connectivity(&self) -> Result<(), String> {
        retry(&RetryPolicy::no_retries(), self.client.provider(), || {
            self.client.complete(&self.params.model, "ping")
        })
        .await
        .map(|_| ())
        .map_err(|e| describe_failure(&e))
    }
}

/// Failure marker classifying what went wrong, written into the output
/// column in place of a label.
fn describe_failure(error: &RemoteError) -> String {
    match error {
        RemoteError::RateLimited { .. } => {
            format!("[AI failed: rate limited, retry later: {}]", error)
        }
        RemoteError::InvalidApiKey { .. } => {
            format!("[AI failed: invalid API key, check credentials: {}]", error)
        }
        RemoteError::NotFound { .. } => {
            format!("[AI failed: endpoint or model misconfigured: {}]", error)
        }
        RemoteError::Timeout { .. } => {
            format!("[AI failed: request timed out, check network: {}]", error)
        }
        _ => format!("[AI failed: {}]", error),
    }
}

#[async_trait]
impl RemoteOperation for AnnotateOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::AiAnnotate
    }

    fn cache_key(&self, text: &str) -> CacheKey {
        fingerprint(text, &OperationParams::AiAnnotate(self.params.clone()))
    }

    async fn enrich(&self, text: &str) -> Result<String, String> {
        let prompt = render_prompt(&self.params.prompt_template, text);
        let result = retry(&self.retry, self.client.provider(), || {
            self.client.complete(&self.params.model, &prompt)
        })
        .await;
        match result {
            Ok(label) => Ok(label.trim().to_string()),
            Err(e) => {
                tracing::warn!(
                    provider = self.client.provider(),
                    model = %self.params.model,
                    error = %e,
                    "AI labeling failed"
                );
                Err(describe_failure(&e))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

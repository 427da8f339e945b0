//! HTTP client for OpenAI-compatible chat completion endpoints.

use crate::annotate::types::{ApiErrorResponse, ChatMessage, ChatRequest, ChatResponse};
use async_trait::async_trait;
use reqwest::StatusCode;
use revlens_core::RemoteError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Deterministic labeling wants the coldest sampling the API allows.
const LABELING_TEMPERATURE: f32 = 0.0;
const MAX_COMPLETION_TOKENS: u32 = 1000;

/// Abstraction over a chat completion backend, mockable in tests.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Provider identifier, used in logs and error messages.
    fn provider(&self) -> &str;

    /// Send one user prompt to the given model and return the reply text.
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, RemoteError>;
}

/// Client for any OpenAI-compatible `POST /chat/completions` endpoint.
///
/// DeepSeek, Moonshot and self-hosted gateways all speak this shape;
/// only the base URL and key differ.
pub struct OpenAiChatClient {
    client: reqwest::Client,
    provider: String,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
    rate_limiter: Arc<Semaphore>,
    last_request: Mutex<Option<Instant>>,
    min_request_interval: Duration,
}

impl OpenAiChatClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider: "openai".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            rate_limiter: Arc::new(Semaphore::new(5)),
            last_request: Mutex::new(None),
            min_request_interval: Duration::ZERO,
        }
    }

    /// Point the client at a compatible non-OpenAI endpoint.
    pub fn with_base_url(mut self, provider: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.provider = provider.into();
        self.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.rate_limiter = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    pub fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_request_interval {
                tokio::time::sleep(self.min_request_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn map_status(&self, status: StatusCode, body: &str) -> RemoteError {
        let message = serde_json::from_str::<ApiErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.chars().take(200).collect());
        match status {
            StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited {
                provider: self.provider.clone(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::InvalidApiKey {
                provider: self.provider.clone(),
            },
            StatusCode::NOT_FOUND => RemoteError::NotFound {
                provider: self.provider.clone(),
                message,
            },
            _ => RemoteError::RequestFailed {
                provider: self.provider.clone(),
                status: status.as_u16() as i32,
                message,
            },
        }
    }

    fn map_send_error(&self, error: reqwest::Error) -> RemoteError {
        if error.is_timeout() {
            RemoteError::Timeout {
                provider: self.provider.clone(),
            }
        } else {
            RemoteError::RequestFailed {
                provider: self.provider.clone(),
                status: 0,
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<String, RemoteError> {
        let _permit =
            self.rate_limiter
                .acquire()
                .await
                .map_err(|_| RemoteError::RequestFailed {
                    provider: self.provider.clone(),
                    status: 0,
                    message: "rate limiter closed".to_string(),
                })?;
        self.pace().await;

        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: LABELING_TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(self.request_timeout)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.map_status(status, &body));
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| RemoteError::InvalidResponse {
                    provider: self.provider.clone(),
                    reason: e.to_string(),
                })?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RemoteError::InvalidResponse {
                provider: self.provider.clone(),
                reason: "empty choices array".to_string(),
            })
    }
}

impl std::fmt::Debug for OpenAiChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatClient")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! HTTP client for LibreTranslate-compatible translation backends.

use crate::translate::types::{ApiErrorResponse, TranslateRequest, TranslateResponse};
use async_trait::async_trait;
use reqwest::StatusCode;
use revlens_core::RemoteError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Abstraction over a translation backend, mockable in tests.
#[async_trait]
pub trait TranslateClient: Send + Sync {
    /// Backend identifier, used in logs and error messages.
    fn engine(&self) -> &str;

    /// Translate one chunk of text.
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, RemoteError>;
}

/// Client for a LibreTranslate-style `POST /translate` endpoint.
///
/// Concurrent requests are bounded by a semaphore and paced to a minimum
/// interval, which keeps a batch from tripping backend rate limits in
/// the first place.
pub struct HttpTranslateClient {
    client: reqwest::Client,
    engine: String,
    base_url: String,
    api_key: Option<String>,
    request_timeout: Duration,
    rate_limiter: Arc<Semaphore>,
    last_request: Mutex<Option<Instant>>,
    min_request_interval: Duration,
}

impl HttpTranslateClient {
    pub fn new(engine: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            engine: engine.into(),
            base_url: base_url.into(),
            api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            rate_limiter: Arc::new(Semaphore::new(2)),
            last_request: Mutex::new(None),
            min_request_interval: Duration::from_millis(500),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
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

    /// Wait until this request respects the pacing interval.
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
            .map(|e| e.error)
            .unwrap_or_else(|_| body.chars().take(200).collect());
        match status {
            StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited {
                provider: self.engine.clone(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::InvalidApiKey {
                provider: self.engine.clone(),
            },
            StatusCode::NOT_FOUND => RemoteError::NotFound {
                provider: self.engine.clone(),
                message,
            },
            _ => RemoteError::RequestFailed {
                provider: self.engine.clone(),
                status: status.as_u16() as i32,
                message,
            },
        }
    }

    fn map_send_error(&self, error: reqwest::Error) -> RemoteError {
        if error.is_timeout() {
            RemoteError::Timeout {
                provider: self.engine.clone(),
            }
        } else {
            RemoteError::RequestFailed {
                provider: self.engine.clone(),
                status: 0,
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl TranslateClient for HttpTranslateClient {
    fn engine(&self) -> &str {
        &self.engine
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, RemoteError> {
        let _permit =
            self.rate_limiter
                .acquire()
                .await
                .map_err(|_| RemoteError::RequestFailed {
                    provider: self.engine.clone(),
                    status: 0,
                    message: "rate limiter closed".to_string(),
                })?;
        self.pace().await;

        let request = TranslateRequest {
            q: text.to_string(),
            source: source_lang.to_string(),
            target: target_lang.to_string(),
            format: "text".to_string(),
            api_key: self.api_key.clone(),
        };

        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .timeout(self.request_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.map_status(status, &body));
        }

        let parsed: TranslateResponse =
            response
                .json()
                .await
                .map_err(|e| RemoteError::InvalidResponse {
                    provider: self.engine.clone(),
                    reason: e.to_string(),
                })?;
        Ok(parsed.translated_text)
    }
}

impl std::fmt::Debug for HttpTranslateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTranslateClient")
            .field("engine", &self.engine)
            .field("base_url", &self.base_url)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

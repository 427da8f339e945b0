//! Mock backends for testing operations and the batch engine without a
//! network.

use crate::annotate::ChatClient;
use crate::translate::TranslateClient;
use async_trait::async_trait;
use revlens_core::RemoteError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Translation backend that returns its input, optionally transformed,
/// and counts calls.
pub struct IdentityTranslateClient {
    calls: AtomicUsize,
    uppercase: bool,
}

impl IdentityTranslateClient {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            uppercase: false,
        }
    }

    /// Uppercase the input, making it visible whether a piece of text
    /// actually went through the backend.
    pub fn uppercasing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            uppercase: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for IdentityTranslateClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslateClient for IdentityTranslateClient {
    fn engine(&self) -> &str {
        "mock"
    }

    async fn translate(
        &self,
        text: &str,
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<String, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.uppercase {
            Ok(text.to_uppercase())
        } else {
            Ok(text.to_string())
        }
    }
}

/// Translation backend that fails transiently for the first N calls,
/// then behaves as the identity.
pub struct FlakyTranslateClient {
    calls: AtomicUsize,
    failures: usize,
}

impl FlakyTranslateClient {
    pub fn failing_first(failures: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslateClient for FlakyTranslateClient {
    fn engine(&self) -> &str {
        "flaky-mock"
    }

    async fn translate(
        &self,
        text: &str,
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<String, RemoteError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(RemoteError::RequestFailed {
                provider: "flaky-mock".to_string(),
                status: 503,
                message: "temporarily unavailable".to_string(),
            })
        } else {
            Ok(text.to_string())
        }
    }
}

/// Translation backend that always fails with a fixed error.
pub struct ScriptedTranslateClient {
    calls: AtomicUsize,
    error: RemoteError,
}

impl ScriptedTranslateClient {
    pub fn always_failing(error: RemoteError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            error,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslateClient for ScriptedTranslateClient {
    fn engine(&self) -> &str {
        "scripted-mock"
    }

    async fn translate(
        &self,
        _text: &str,
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<String, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// Chat backend replying with a fixed string or error, recording the
/// last prompt it saw.
pub struct ScriptedChatClient {
    calls: AtomicUsize,
    reply: Result<String, RemoteError>,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedChatClient {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply: Ok(reply.into()),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn always_failing(error: RemoteError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply: Err(error),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    fn provider(&self) -> &str {
        "scripted-mock"
    }

    async fn complete(&self, _model: &str, prompt: &str) -> Result<String, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        self.reply.clone()
    }
}

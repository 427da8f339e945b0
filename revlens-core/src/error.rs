//! Error types for REVLENS operations

use thiserror::Error;

/// Remote operation errors.
///
/// The transient/permanent split drives the retry policy: transient
/// failures are retried with backoff, permanent failures fail fast.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("Invalid API key for {provider}")]
    InvalidApiKey { provider: String },

    #[error("Endpoint or model not found for {provider}: {message}")]
    NotFound { provider: String, message: String },

    #[error("Request to {provider} timed out")]
    Timeout { provider: String },

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl RemoteError {
    /// Whether retrying could plausibly succeed.
    ///
    /// Rate limits, timeouts and server-side/network failures are
    /// transient; auth and misconfiguration are not.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::RateLimited { .. } | RemoteError::Timeout { .. } => true,
            RemoteError::RequestFailed { status, .. } => *status == 0 || *status >= 500,
            RemoteError::InvalidApiKey { .. }
            | RemoteError::NotFound { .. }
            | RemoteError::InvalidResponse { .. } => false,
        }
    }
}

/// Cache tier errors.
///
/// Read failures never reach callers (a corrupt or unreadable entry is a
/// miss); these surface only from explicit durable writes and maintenance.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Failed to create cache directory {path}: {reason}")]
    CreateDirFailed { path: String, reason: String },

    #[error("Failed to write cache entry {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Cache maintenance failed under {path}: {reason}")]
    MaintenanceFailed { path: String, reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Engine orchestration errors.
///
/// Per-row remote failures are NOT errors; they become `Outcome::Failure`
/// entries in the result set. These variants cover the worker pool itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Batch cancelled before the task started")]
    Cancelled,

    #[error("Worker task panicked")]
    TaskPanicked,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse configuration: {reason}")]
    ParseFailed { reason: String },
}

/// Master error type for all REVLENS errors.
#[derive(Debug, Clone, Error)]
pub enum RevlensError {
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for REVLENS operations.
pub type RevlensResult<T> = Result<T, RevlensError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display_rate_limited() {
        let err = RemoteError::RateLimited {
            provider: "deepseek".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Rate limited"));
        assert!(msg.contains("deepseek"));
    }

    #[test]
    fn test_remote_error_transient_classes() {
        assert!(RemoteError::RateLimited {
            provider: "p".into()
        }
        .is_transient());
        assert!(RemoteError::Timeout {
            provider: "p".into()
        }
        .is_transient());
        assert!(RemoteError::RequestFailed {
            provider: "p".into(),
            status: 503,
            message: "unavailable".into()
        }
        .is_transient());
        // Network-level failure with no HTTP status.
        assert!(RemoteError::RequestFailed {
            provider: "p".into(),
            status: 0,
            message: "connection reset".into()
        }
        .is_transient());
    }

    #[test]
    fn test_remote_error_permanent_classes() {
        assert!(!RemoteError::InvalidApiKey {
            provider: "p".into()
        }
        .is_transient());
        assert!(!RemoteError::NotFound {
            provider: "p".into(),
            message: "no such model".into()
        }
        .is_transient());
        assert!(!RemoteError::RequestFailed {
            provider: "p".into(),
            status: 400,
            message: "bad request".into()
        }
        .is_transient());
    }

    #[test]
    fn test_cache_error_display_write_failed() {
        let err = CacheError::WriteFailed {
            key: "abcd".to_string(),
            reason: "disk full".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("abcd"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_revlens_error_from_variants() {
        let remote = RevlensError::from(RemoteError::Timeout {
            provider: "p".into(),
        });
        assert!(matches!(remote, RevlensError::Remote(_)));

        let cache = RevlensError::from(CacheError::LockPoisoned);
        assert!(matches!(cache, RevlensError::Cache(_)));

        let engine = RevlensError::from(EngineError::Cancelled);
        assert!(matches!(engine, RevlensError::Engine(_)));

        let config = RevlensError::from(ConfigError::MissingRequired {
            field: "api_key".into(),
        });
        assert!(matches!(config, RevlensError::Config(_)));
    }
}

//! Configuration types

use crate::error::{ConfigError, RevlensResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Retry configuration for remote operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempt budget, including the first try.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Multiplier applied to the backoff after each retry.
    pub backoff_multiplier: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 1.0,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }
}

/// Configuration for the in-process volatile cache tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatileCacheConfig {
    /// Maximum number of entries.
    pub capacity: usize,
    /// Entries older than this are treated as absent on read.
    pub ttl: Duration,
}

impl Default for VolatileCacheConfig {
    fn default() -> Self {
        Self {
            capacity: 2000,
            ttl: Duration::from_secs(24 * 3600),
        }
    }
}

impl VolatileCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Configuration for the file-backed durable cache tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurableCacheConfig {
    /// Directory under which namespaced cache directories live.
    pub root_dir: PathBuf,
    /// Namespace directory, one per cache purpose (e.g. "ai_annotate").
    pub namespace: String,
}

impl DurableCacheConfig {
    pub fn new(root_dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            namespace: namespace.into(),
        }
    }
}

/// Configuration for the enrichment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum simultaneously in-flight remote calls.
    pub concurrency: usize,
    /// Delay inserted after each remote call, throttling the backend.
    pub inter_call_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            inter_call_delay: Duration::ZERO,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_inter_call_delay(mut self, delay: Duration) -> Self {
        self.inter_call_delay = delay;
        self
    }

    /// Serialized execution with a fixed inter-call delay, the shape used
    /// for translation workloads against rate-limited backends.
    pub fn serial_with_delay(delay: Duration) -> Self {
        Self {
            concurrency: 1,
            inter_call_delay: delay,
        }
    }
}

/// Master configuration struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevlensConfig {
    pub volatile_cache: VolatileCacheConfig,
    pub durable_cache: DurableCacheConfig,
    pub retry: RetryConfig,
    pub engine: EngineConfig,
}

impl RevlensConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> RevlensResult<Self> {
        toml::from_str(text).map_err(|e| {
            ConfigError::ParseFailed {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> RevlensResult<()> {
        if self.engine.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.concurrency".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.volatile_cache.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "volatile_cache.capacity".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.durable_cache.namespace.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "durable_cache.namespace".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_backoff, Duration::from_secs(1));
    }

    #[test]
    fn test_builder_methods() {
        let config = VolatileCacheConfig::new()
            .with_capacity(100)
            .with_ttl(Duration::from_secs(60));
        assert_eq!(config.capacity, 100);
        assert_eq!(config.ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_engine_serial_preset() {
        let config = EngineConfig::serial_with_delay(Duration::from_millis(100));
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.inter_call_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_config_from_toml() {
        let toml_text = r#"
            [volatile_cache]
            capacity = 500
            ttl = { secs = 3600, nanos = 0 }

            [durable_cache]
            root_dir = "/var/cache/revlens"
            namespace = "ai_annotate"

            [retry]
            max_attempts = 3
            initial_backoff = { secs = 1, nanos = 0 }
            backoff_multiplier = 1.0

            [engine]
            concurrency = 3
            inter_call_delay = { secs = 0, nanos = 100000000 }
        "#;
        let config = RevlensConfig::from_toml_str(toml_text).unwrap();
        assert_eq!(config.volatile_cache.capacity, 500);
        assert_eq!(config.durable_cache.namespace, "ai_annotate");
        assert_eq!(config.engine.concurrency, 3);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_parse_error() {
        let err = RevlensConfig::from_toml_str("not valid toml [[").unwrap_err();
        assert!(format!("{}", err).contains("parse"));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = RevlensConfig {
            volatile_cache: VolatileCacheConfig::default(),
            durable_cache: DurableCacheConfig::new("/tmp/c", "ns"),
            retry: RetryConfig::default(),
            engine: EngineConfig::default(),
        };
        config.engine.concurrency = 0;
        assert!(config.validate().is_err());
    }
}

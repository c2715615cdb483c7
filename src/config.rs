//! Client configuration.
//!
//! A [`ClientConfig`] can be built in code or loaded from TOML:
//!
//! ```toml
//! base_url = "https://api.example.com"
//! keep_unused_for = "60s"
//! maintenance_interval = "30s"
//! max_cache_entries = 1000
//! storage_dir = ".storefront"
//! ```
//!
//! `STOREFRONT_API_BASE_URL` overrides `base_url` when set.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::errors::ConfigError;

/// Default retention window for cache entries without subscribers
pub const DEFAULT_KEEP_UNUSED_FOR: Duration = Duration::from_secs(60);
/// Default interval between background cache maintenance passes
pub const DEFAULT_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(30);
/// Default upper bound on cached entries before LRU eviction
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1000;
/// Environment variable overriding the configured base URL
pub const BASE_URL_ENV: &str = "STOREFRONT_API_BASE_URL";

/// Configuration for a [`crate::client::QueryClient`] and its collaborators
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_keep_unused_for", deserialize_with = "human_duration")]
    pub keep_unused_for: Duration,
    #[serde(
        default = "default_maintenance_interval",
        deserialize_with = "human_duration"
    )]
    pub maintenance_interval: Duration,
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: usize,
    /// Per-request timeout. Unset means requests may hang until the server answers.
    #[serde(default, deserialize_with = "optional_human_duration")]
    pub request_timeout: Option<Duration>,
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
}

fn default_keep_unused_for() -> Duration {
    DEFAULT_KEEP_UNUSED_FOR
}

fn default_maintenance_interval() -> Duration {
    DEFAULT_MAINTENANCE_INTERVAL
}

fn default_max_cache_entries() -> usize {
    DEFAULT_MAX_CACHE_SIZE
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".storefront")
}

fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

fn optional_human_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|raw| humantime::parse_duration(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

impl ClientConfig {
    /// Create a configuration with default settings for the given API origin
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            keep_unused_for: DEFAULT_KEEP_UNUSED_FOR,
            maintenance_interval: DEFAULT_MAINTENANCE_INTERVAL,
            max_cache_entries: DEFAULT_MAX_CACHE_SIZE,
            request_timeout: None,
            storage_dir: default_storage_dir(),
        }
    }

    /// Set how long an entry without subscribers is retained
    pub fn with_keep_unused_for(mut self, keep_unused_for: Duration) -> Self {
        self.keep_unused_for = keep_unused_for;
        self
    }

    /// Set the background maintenance interval
    pub fn with_maintenance_interval(mut self, interval: Duration) -> Self {
        self.maintenance_interval = interval;
        self
    }

    /// Set the cache size limit enforced by LRU eviction
    pub fn with_max_cache_entries(mut self, max_cache_entries: usize) -> Self {
        self.max_cache_entries = max_cache_entries;
        self
    }

    /// Set a per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the directory used for client-side persisted state
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load from `path`, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_path(path)?.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                self.base_url = base_url;
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.maintenance_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "maintenance_interval",
                reason: "must be > 0".to_string(),
            });
        }
        if self.max_cache_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_cache_entries",
                reason: "must be > 0".to_string(),
            });
        }
        if matches!(self.request_timeout, Some(timeout) if timeout.is_zero()) {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout",
                reason: "must be > 0 when set".to_string(),
            });
        }
        Ok(())
    }
}

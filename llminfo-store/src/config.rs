//! Configuration management.
//!
//! Settings live in `<config dir>/llminfo/config.json`. Every field is
//! optional; a missing file yields the defaults.

use crate::error::StoreError;
use crate::persistence::{default_cache_dir, default_providers_path, default_settings_path};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Cache directory override.
    pub cache_dir: Option<PathBuf>,
    /// User provider definitions file override.
    pub providers_file: Option<PathBuf>,
    /// Per-call HTTP timeout in seconds.
    pub request_timeout_secs: u64,
    /// Deadline for a whole multi-provider query, in seconds.
    pub overall_timeout_secs: Option<u64>,
    /// Cache TTL for providers whose definition sets none, in seconds.
    pub default_cache_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            providers_file: None,
            request_timeout_secs: 30,
            overall_timeout_secs: None,
            default_cache_ttl_secs: 3600,
        }
    }
}

impl Settings {
    /// Loads settings from the default path.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(&default_settings_path())
    }

    /// Loads settings from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;

        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.request_timeout_secs == 0 {
            return Err(StoreError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.default_cache_ttl_secs == 0 {
            return Err(StoreError::Config(
                "default_cache_ttl_secs must be positive".to_string(),
            ));
        }
        if self.overall_timeout_secs == Some(0) {
            return Err(StoreError::Config(
                "overall_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Effective user provider definitions file.
    pub fn providers_file(&self) -> PathBuf {
        self.providers_file
            .clone()
            .unwrap_or_else(default_providers_path)
    }

    /// Per-call HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Overall query deadline, if configured.
    pub fn overall_timeout(&self) -> Option<Duration> {
        self.overall_timeout_secs.map(Duration::from_secs)
    }

    /// Default cache TTL.
    pub fn default_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.default_cache_ttl_secs)
    }
}

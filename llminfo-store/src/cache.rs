//! TTL cache of provider results.
//!
//! One JSON file per key under the cache directory:
//!
//! ```text
//! <provider>_<kind>.json
//! <provider>_<kind>_<fingerprint>.json
//! ```
//!
//! The file holds `{"fetched_at": <RFC 3339>, "payload": <records>}`. A file
//! that is missing, stale, or undecodable is a miss.

use chrono::{DateTime, TimeDelta, Utc};
use ring::digest::{SHA256, digest};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::StoreError;
use crate::persistence::{ensure_dir, load_json, save_json};

// ============================================================================
// Cache Key
// ============================================================================

/// Which query a cache entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Model list.
    Models,
    /// Credit balance.
    Credits,
}

impl ResourceKind {
    /// Returns the identifier used in file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Models => "models",
            Self::Credits => "credits",
        }
    }

    fn all() -> [ResourceKind; 2] {
        [Self::Models, Self::Credits]
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Provider name.
    pub provider: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Query parameters, if the request had any.
    pub params: Option<String>,
}

impl CacheKey {
    /// Key for a provider's model list.
    pub fn models(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind: ResourceKind::Models,
            params: None,
        }
    }

    /// Key for a provider's credit balance.
    pub fn credits(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind: ResourceKind::Credits,
            params: None,
        }
    }

    /// Adds query parameters to the key.
    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = Some(params.into());
        self
    }

    /// First 16 hex digits of the SHA-256 of the parameters.
    pub fn fingerprint(&self) -> Option<String> {
        self.params.as_ref().map(|params| {
            digest(&SHA256, params.as_bytes())
                .as_ref()
                .iter()
                .take(8)
                .map(|b| format!("{b:02x}"))
                .collect()
        })
    }

    /// File name of this entry.
    pub fn file_name(&self) -> String {
        match self.fingerprint() {
            Some(fp) => format!("{}_{}_{fp}.json", self.provider, self.kind),
            None => format!("{}_{}.json", self.provider, self.kind),
        }
    }
}

fn belongs_to(file_name: &str, provider: &str) -> bool {
    let Some(rest) = file_name
        .strip_prefix(provider)
        .and_then(|r| r.strip_prefix('_'))
        .and_then(|r| r.strip_suffix(".json"))
    else {
        return false;
    };

    ResourceKind::all().iter().any(|kind| {
        rest.strip_prefix(kind.as_str()).is_some_and(|tail| {
            tail.is_empty()
                || tail.strip_prefix('_').is_some_and(|fp| {
                    fp.len() == 16 && fp.chars().all(|c| c.is_ascii_hexdigit())
                })
        })
    })
}

// ============================================================================
// Cache Entry
// ============================================================================

/// A stored result with its fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the payload was fetched.
    pub fetched_at: DateTime<Utc>,
    /// Serialized canonical records.
    pub payload: Value,
}

impl CacheEntry {
    /// Returns the age of the entry.
    pub fn age(&self) -> TimeDelta {
        Utc::now() - self.fetched_at
    }

    /// Returns true if the entry is younger than `ttl`.
    ///
    /// Entries stamped in the future are stale.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let age = self.age();
        age >= TimeDelta::zero() && age < ttl
    }

    /// Decodes the payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(T::deserialize(&self.payload)?)
    }
}

// ============================================================================
// Cache Store
// ============================================================================

/// File-backed cache, safe to share between concurrent tasks.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path of `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Returns the entry for `key` if it exists, decodes, and is younger
    /// than `ttl`.
    #[instrument(skip(self), fields(provider = %key.provider, kind = %key.kind))]
    pub async fn get(&self, key: &CacheKey, ttl: Duration) -> Option<CacheEntry> {
        let path = self.path_for(key);

        let entry: CacheEntry = match load_json(&path).await {
            Ok(entry) => entry,
            Err(e) if e.is_not_found() => {
                debug!("Cache miss");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable cache entry, treating as miss");
                return None;
            }
        };

        if entry.is_fresh(ttl) {
            debug!(age_secs = entry.age().num_seconds(), "Cache hit");
            Some(entry)
        } else {
            debug!(age_secs = entry.age().num_seconds(), "Cache entry stale");
            None
        }
    }

    /// Stores `payload` under `key`, stamped with the current time.
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        payload: &T,
    ) -> Result<CacheEntry, StoreError> {
        self.put_with_timestamp(key, payload, Utc::now()).await
    }

    /// Stores `payload` under `key` with an explicit fetch time.
    #[instrument(skip(self, payload), fields(provider = %key.provider, kind = %key.kind))]
    pub async fn put_with_timestamp<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        payload: &T,
        fetched_at: DateTime<Utc>,
    ) -> Result<CacheEntry, StoreError> {
        let entry = CacheEntry {
            fetched_at,
            payload: serde_json::to_value(payload)?,
        };
        save_json(&self.path_for(key), &entry).await?;
        debug!("Cache entry written");
        Ok(entry)
    }

    /// Removes the entry for `key`. Returns true if a file was removed.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool, StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every entry of `provider`. Returns the number removed.
    #[instrument(skip(self))]
    pub async fn clear(&self, provider: &str) -> Result<usize, StoreError> {
        self.remove_matching(|name| belongs_to(name, provider)).await
    }

    /// Removes every cache entry. Returns the number removed.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<usize, StoreError> {
        self.remove_matching(|name| {
            name.ends_with(".json") && !name.starts_with('.')
        })
        .await
    }

    async fn remove_matching(&self, matches: impl Fn(&str) -> bool) -> Result<usize, StoreError> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if matches(&name) && entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }

        debug!(removed, dir = %self.dir.display(), "Cache entries removed");
        Ok(removed)
    }

    /// Creates the cache directory if missing.
    pub async fn ensure_dir(&self) -> Result<(), StoreError> {
        ensure_dir(&self.dir).await
    }
}

// ============================================================================
// Tests
// ============================================================================

// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # llminfo Store
//!
//! Everything llminfo keeps on disk.
//!
//! - **CacheStore**: TTL cache of provider results, one file per key
//! - **Settings**: user configuration with defaults
//! - **Persistence**: atomic JSON/file writes and default directories
//!
//! ## Usage
//!
//! ```ignore
//! use llminfo_store::{CacheKey, CacheStore, Settings};
//!
//! let settings = Settings::load()?;
//! let cache = CacheStore::new(settings.cache_dir());
//!
//! let key = CacheKey::models("groq");
//! if let Some(entry) = cache.get(&key, settings.default_cache_ttl()).await {
//!     let models: Vec<ModelRecord> = entry.decode()?;
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod persistence;

pub use cache::{CacheEntry, CacheKey, CacheStore, ResourceKind};
pub use config::Settings;
pub use error::StoreError;
pub use persistence::{
    default_cache_dir, default_config_dir, default_providers_path, default_settings_path,
    ensure_dir, load_json, save_json, write_atomic,
};

//! CLI command implementations.

pub mod best_free;
pub mod cache;
pub mod credits;
pub mod import_provider;
pub mod models;
pub mod providers;
pub mod test_provider;

use anyhow::{Context, Result};
use llminfo_fetch::FetchSettings;
use llminfo_providers::{ProviderRegistry, QueryEngine, QueryOptions};
use llminfo_store::{CacheStore, Settings};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::Cli;

/// Loads settings from `--config` or the default location.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::load().context("failed to load settings")?,
    };
    Ok(settings)
}

/// Everything a command needs to talk to providers.
pub struct AppContext {
    pub settings: Settings,
    pub registry: ProviderRegistry,
    pub cache: CacheStore,
}

impl AppContext {
    /// Loads settings, the provider registry, and the cache.
    pub async fn load(cli: &Cli) -> Result<Self> {
        let settings = load_settings(cli)?;

        let http = FetchSettings::default()
            .with_timeout(settings.request_timeout())
            .http_client()?;

        let providers_file = settings.providers_file();
        debug!(path = %providers_file.display(), "Loading provider definitions");

        let registry = ProviderRegistry::load_with_user_file(&providers_file)
            .await?
            .with_http_client(Arc::new(http))
            .with_default_ttl(settings.default_cache_ttl());

        let cache = CacheStore::new(settings.cache_dir());

        Ok(Self {
            settings,
            registry,
            cache,
        })
    }

    /// Query engine for one command run.
    ///
    /// `timeout` overrides the configured overall timeout.
    pub fn engine(&self, force_refresh: bool, timeout: Option<Duration>) -> QueryEngine<'_> {
        let options = QueryOptions::default()
            .force_refresh(force_refresh)
            .overall_timeout(timeout.or_else(|| self.settings.overall_timeout()));
        QueryEngine::new(&self.registry, &self.cache).with_options(options)
    }
}

//! Query orchestration.
//!
//! [`QueryEngine`] answers model and credit queries for one or many
//! providers. Each provider runs through the same flow: resolve the
//! capability, look in the cache, fetch on a miss, store the result.
//!
//! Batch queries fan out with one in-flight request per provider. A failure
//! stays with its provider and results come back in the order the names were
//! given (registry order for "all providers").

use futures::future::join_all;
use llminfo_core::{CreditRecord, ModelRecord, ProviderError};
use llminfo_store::{CacheKey, CacheStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::registry::ProviderRegistry;

// ============================================================================
// Result Types
// ============================================================================

/// Where a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// A fresh cache entry.
    Cache,
    /// A live provider call.
    Network,
    /// No call made; the provider lacks the endpoint.
    Unsupported,
}

/// A value and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    /// The value.
    pub value: T,
    /// Its origin.
    pub source: Source,
}

/// Outcome of a query against one provider.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
    /// Provider name.
    pub provider: String,
    /// The value, or the typed failure for this provider.
    pub outcome: Result<Fetched<T>, ProviderError>,
}

impl<T> QueryResult<T> {
    /// Returns true if the query succeeded.
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The value, if the query succeeded.
    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok().map(|f| &f.value)
    }

    /// The failure, if the query failed.
    pub fn error(&self) -> Option<&ProviderError> {
        self.outcome.as_ref().err()
    }
}

/// Options for one run of the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Skip cache reads; results are still written back.
    pub force_refresh: bool,
    /// Deadline for a whole batch. Providers still running when it passes
    /// fail with [`ProviderError::Timeout`].
    pub overall_timeout: Option<Duration>,
}

impl QueryOptions {
    /// Sets `force_refresh`.
    #[must_use]
    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    /// Sets the overall timeout.
    #[must_use]
    pub fn overall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.overall_timeout = timeout;
        self
    }
}

// ============================================================================
// Query Engine
// ============================================================================

/// Cache-aware query orchestrator over a [`ProviderRegistry`].
#[derive(Debug, Clone)]
pub struct QueryEngine<'a> {
    registry: &'a ProviderRegistry,
    cache: &'a CacheStore,
    options: QueryOptions,
}

impl<'a> QueryEngine<'a> {
    /// Creates an engine with default options.
    pub fn new(registry: &'a ProviderRegistry, cache: &'a CacheStore) -> Self {
        Self {
            registry,
            cache,
            options: QueryOptions::default(),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the active options.
    pub fn options(&self) -> QueryOptions {
        self.options
    }

    // ------------------------------------------------------------------------
    // Models
    // ------------------------------------------------------------------------

    /// Models of a single provider. An unknown name is a hard failure.
    pub async fn models_for(&self, name: &str) -> Result<Fetched<Vec<ModelRecord>>, ProviderError> {
        if !self.registry.contains(name) {
            return Err(ProviderError::NotFound(name.to_string()));
        }
        let deadline = self.deadline();
        self.bounded(name, deadline, self.models_one(name)).await
    }

    /// Models of each named provider, in the order given.
    #[instrument(skip(self, names))]
    pub async fn query_models<S: AsRef<str>>(&self, names: &[S]) -> Vec<QueryResult<Vec<ModelRecord>>> {
        let deadline = self.deadline();
        let results = join_all(names.iter().map(|name| {
            let name = name.as_ref();
            async move {
                QueryResult {
                    provider: name.to_string(),
                    outcome: self.bounded(name, deadline, self.models_one(name)).await,
                }
            }
        }))
        .await;

        log_batch("models", &results);
        results
    }

    /// Models of every registered provider, in registry order.
    pub async fn query_all_models(&self) -> Vec<QueryResult<Vec<ModelRecord>>> {
        let names = self.registry.list();
        self.query_models(&names).await
    }

    async fn models_one(&self, name: &str) -> Result<Fetched<Vec<ModelRecord>>, ProviderError> {
        let capability = self.registry.resolve(name)?;
        let key = CacheKey::models(name);

        if let Some(models) = self.cached::<Vec<ModelRecord>>(&key, capability.cache_ttl()).await {
            return Ok(Fetched {
                value: models,
                source: Source::Cache,
            });
        }

        let models = capability.fetch_models().await?;
        self.store(&key, &models).await;
        Ok(Fetched {
            value: models,
            source: Source::Network,
        })
    }

    // ------------------------------------------------------------------------
    // Credits
    // ------------------------------------------------------------------------

    /// Credits of a single provider. An unknown name is a hard failure.
    pub async fn credits_for(
        &self,
        name: &str,
    ) -> Result<Fetched<Option<CreditRecord>>, ProviderError> {
        if !self.registry.contains(name) {
            return Err(ProviderError::NotFound(name.to_string()));
        }
        let deadline = self.deadline();
        self.bounded(name, deadline, self.credits_one(name)).await
    }

    /// Credits of each named provider, in the order given.
    #[instrument(skip(self, names))]
    pub async fn query_credits<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Vec<QueryResult<Option<CreditRecord>>> {
        let deadline = self.deadline();
        let results = join_all(names.iter().map(|name| {
            let name = name.as_ref();
            async move {
                QueryResult {
                    provider: name.to_string(),
                    outcome: self.bounded(name, deadline, self.credits_one(name)).await,
                }
            }
        }))
        .await;

        log_batch("credits", &results);
        results
    }

    async fn credits_one(&self, name: &str) -> Result<Fetched<Option<CreditRecord>>, ProviderError> {
        let capability = self.registry.resolve(name)?;

        if !capability.supports_credits() {
            debug!(provider = %name, "Provider has no credits endpoint");
            return Ok(Fetched {
                value: None,
                source: Source::Unsupported,
            });
        }

        let key = CacheKey::credits(name);
        if let Some(credits) = self.cached::<CreditRecord>(&key, capability.cache_ttl()).await {
            return Ok(Fetched {
                value: Some(credits),
                source: Source::Cache,
            });
        }

        let credits = capability.fetch_credits().await?;
        if let Some(record) = &credits {
            self.store(&key, record).await;
        }
        Ok(Fetched {
            value: credits,
            source: Source::Network,
        })
    }

    // ------------------------------------------------------------------------
    // Shared Flow
    // ------------------------------------------------------------------------

    fn deadline(&self) -> Option<Instant> {
        self.options.overall_timeout.map(|t| Instant::now() + t)
    }

    async fn bounded<T>(
        &self,
        name: &str,
        deadline: Option<Instant>,
        work: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        let Some(deadline) = deadline else {
            return work.await;
        };

        match tokio::time::timeout_at(deadline, work).await {
            Ok(result) => result,
            Err(_) => {
                let after = self.options.overall_timeout.unwrap_or_default();
                warn!(provider = %name, after_secs = after.as_secs_f64(), "Provider timed out");
                Err(ProviderError::Timeout {
                    provider: name.to_string(),
                    after,
                })
            }
        }
    }

    async fn cached<T: DeserializeOwned>(&self, key: &CacheKey, ttl: Duration) -> Option<T> {
        if self.options.force_refresh {
            debug!(provider = %key.provider, kind = %key.kind, "Force refresh, skipping cache");
            return None;
        }

        let entry = self.cache.get(key, ttl).await?;
        match entry.decode() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(provider = %key.provider, kind = %key.kind, error = %e, "Cached payload does not decode");
                None
            }
        }
    }

    async fn store<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) {
        if let Err(e) = self.cache.put(key, value).await {
            warn!(provider = %key.provider, kind = %key.kind, error = %e, "Failed to write cache entry");
        }
    }
}

fn log_batch<T>(what: &str, results: &[QueryResult<T>]) {
    let failed = results.iter().filter(|r| !r.is_ok()).count();
    info!(query = what, providers = results.len(), failed, "Batch query finished");
}

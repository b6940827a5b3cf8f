//! Provider capability trait.
//!
//! A capability is one provider that can list its models and, optionally,
//! report a credit balance. Declarative providers and hand-written ones
//! implement the same trait and are registered the same way.

use async_trait::async_trait;
use llminfo_core::{CreditRecord, DEFAULT_CACHE_TTL, ModelRecord, ProviderError};
use std::time::Duration;

/// A provider that can be queried for models and credits.
///
/// ## Implementing a Capability
///
/// ```ignore
/// struct LocalOllama;
///
/// #[async_trait]
/// impl ProviderCapability for LocalOllama {
///     fn name(&self) -> &str {
///         "ollama"
///     }
///
///     async fn fetch_models(&self) -> Result<Vec<ModelRecord>, ProviderError> {
///         // Query the local daemon and normalize its answer
///     }
///
///     async fn fetch_credits(&self) -> Result<Option<CreditRecord>, ProviderError> {
///         Ok(None)
///     }
///
///     fn supports_credits(&self) -> bool {
///         false
///     }
/// }
/// ```
#[async_trait]
pub trait ProviderCapability: Send + Sync {
    /// Unique provider name.
    fn name(&self) -> &str;

    /// Fetches and normalizes the provider's model list.
    ///
    /// Ids in the result are unique.
    async fn fetch_models(&self) -> Result<Vec<ModelRecord>, ProviderError>;

    /// Fetches the credit balance.
    ///
    /// Returns `Ok(None)` without a network call when the provider has no
    /// credits endpoint.
    async fn fetch_credits(&self) -> Result<Option<CreditRecord>, ProviderError>;

    /// Whether [`fetch_credits`](Self::fetch_credits) can return a balance.
    fn supports_credits(&self) -> bool {
        true
    }

    /// How long cached results for this provider stay valid.
    fn cache_ttl(&self) -> Duration {
        DEFAULT_CACHE_TTL
    }
}

//! Provider registry.
//!
//! The registry is built once per invocation from two definition sources,
//! built-in and user, plus any capabilities registered in code. It owns the
//! validated definitions and hands out ready-to-use capabilities.
//!
//! Merge rules:
//! - a user entry with the same key as a built-in replaces it entirely and
//!   takes its position; new user entries follow in file order
//! - each definition is validated on its own; one that fails is dropped,
//!   logged, and kept in [`ProviderRegistry::rejected`]
//! - an invalid user override drops the built-in it shadows as well

use llminfo_core::{DefinitionRecord, ModelRecord, ProviderDefinition, ProviderError};
use llminfo_fetch::{CredentialSource, EnvCredentials, HttpClient, ProviderCapability};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::definitions::{
    BUILTIN_DEFINITIONS, SourceEntry, append_definition, parse_source, read_source_file,
};
use crate::generic::GenericProvider;

// ============================================================================
// Origin
// ============================================================================

/// Where a registered provider came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Shipped definition.
    Builtin,
    /// User definition file.
    User,
    /// Registered in code.
    Code,
}

impl Origin {
    /// Returns the identifier for this origin.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::User => "user",
            Self::Code => "code",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Registry Types
// ============================================================================

/// A definition that failed validation and was left out of the registry.
#[derive(Debug, Clone)]
pub struct RejectedDefinition {
    /// Key the definition was found under.
    pub name: String,
    /// Source it came from.
    pub origin: Origin,
    /// Why it was rejected.
    pub error: ProviderError,
}

/// Summary of one registered provider, for listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    /// Provider name.
    pub name: String,
    /// Where it came from.
    pub origin: Origin,
    /// Base URL, for declarative providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the API key, for declarative providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Whether a credit balance can be queried.
    pub supports_credits: bool,
}

#[derive(Clone)]
enum Entry {
    Declarative(ProviderDefinition),
    Capability(Arc<dyn ProviderCapability>),
}

#[derive(Clone)]
struct Registered {
    name: String,
    origin: Origin,
    entry: Entry,
}

// ============================================================================
// Test Report
// ============================================================================

/// Outcome of staging a candidate definition.
#[derive(Debug, Clone)]
pub struct TestReport {
    /// Candidate name (or a placeholder if it had none).
    pub provider: String,
    /// Candidate base URL as given.
    pub base_url: String,
    /// Models returned by the live call, or why staging failed.
    pub outcome: Result<Vec<ModelRecord>, ProviderError>,
}

impl TestReport {
    /// Returns true if the candidate validated and its models call succeeded.
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Number of models returned, 0 on failure.
    pub fn model_count(&self) -> usize {
        self.outcome.as_ref().map_or(0, Vec::len)
    }

    /// The first `n` model ids.
    pub fn sample_ids(&self, n: usize) -> Vec<&str> {
        self.outcome
            .as_ref()
            .map(|models| models.iter().take(n).map(|m| m.id.as_str()).collect())
            .unwrap_or_default()
    }

    /// The failure, if staging failed.
    pub fn error(&self) -> Option<&ProviderError> {
        self.outcome.as_ref().err()
    }
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Registry of provider definitions and capabilities.
pub struct ProviderRegistry {
    entries: Vec<Registered>,
    rejected: Vec<RejectedDefinition>,
    user_source: Option<PathBuf>,
    credentials: Arc<dyn CredentialSource>,
    http: Arc<HttpClient>,
    default_ttl: Option<Duration>,
}

impl ProviderRegistry {
    /// Builds a registry from built-in and user source documents.
    ///
    /// Fails only if a source as a whole cannot be parsed. Individual
    /// invalid definitions are dropped; see [`rejected`](Self::rejected).
    pub fn load(builtin: &str, user: &str) -> Result<Self, ProviderError> {
        let builtin = parse_source(builtin, "builtin")?;
        let user = parse_source(user, "user")?;
        Self::from_entries(builtin, user)
    }

    /// Builds a registry from the shipped definitions and a user file.
    ///
    /// A missing user file is an empty source. The file becomes the target
    /// of [`commit`](Self::commit).
    pub async fn load_with_user_file(path: &Path) -> Result<Self, ProviderError> {
        let builtin = parse_source(BUILTIN_DEFINITIONS, "builtin")?;
        let user = read_source_file(path).await?;
        let mut registry = Self::from_entries(builtin, user)?;
        registry.user_source = Some(path.to_path_buf());
        Ok(registry)
    }

    /// Builds a registry from the shipped definitions only.
    pub fn builtin() -> Result<Self, ProviderError> {
        Self::load(BUILTIN_DEFINITIONS, "")
    }

    fn from_entries(builtin: Vec<SourceEntry>, user: Vec<SourceEntry>) -> Result<Self, ProviderError> {
        let mut slots: Vec<(String, Origin, Result<DefinitionRecord, ProviderError>)> = Vec::new();

        for (key, record) in builtin {
            slots.push((key, Origin::Builtin, record));
        }
        for (key, record) in user {
            if let Some(slot) = slots.iter_mut().find(|(k, _, _)| *k == key) {
                debug!(provider = %key, "User definition overrides built-in");
                *slot = (key, Origin::User, record);
            } else {
                slots.push((key, Origin::User, record));
            }
        }

        let mut entries = Vec::with_capacity(slots.len());
        let mut rejected = Vec::new();
        for (key, origin, record) in slots {
            match record.and_then(|r| r.validate(Some(key.as_str()))) {
                Ok(definition) => entries.push(Registered {
                    name: definition.name.clone(),
                    origin,
                    entry: Entry::Declarative(definition),
                }),
                Err(error) => {
                    warn!(provider = %key, origin = %origin, error = %error, "Rejected provider definition");
                    rejected.push(RejectedDefinition {
                        name: key,
                        origin,
                        error,
                    });
                }
            }
        }

        let http = HttpClient::new().map_err(|e| e.into_provider_error("llminfo"))?;
        info!(providers = entries.len(), rejected = rejected.len(), "Provider registry loaded");

        Ok(Self {
            entries,
            rejected,
            user_source: None,
            credentials: Arc::new(EnvCredentials),
            http: Arc::new(http),
            default_ttl: None,
        })
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Replaces the credential source.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Replaces the HTTP client used by declarative providers.
    #[must_use]
    pub fn with_http_client(mut self, http: Arc<HttpClient>) -> Self {
        self.http = http;
        self
    }

    /// Sets the cache TTL for definitions that do not carry one.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Sets the user definition file that [`commit`](Self::commit) writes to.
    #[must_use]
    pub fn with_user_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_source = Some(path.into());
        self
    }

    /// Registers a hand-written capability.
    ///
    /// A provider of the same name is replaced in place; otherwise the
    /// capability is appended.
    pub fn register_capability(&mut self, capability: Arc<dyn ProviderCapability>) {
        let name = capability.name().to_string();
        let registered = Registered {
            name: name.clone(),
            origin: Origin::Code,
            entry: Entry::Capability(capability),
        };

        if let Some(slot) = self.entries.iter_mut().find(|e| e.name == name) {
            debug!(provider = %name, "Capability replaces registered provider");
            *slot = registered;
        } else {
            self.entries.push(registered);
        }
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    /// Provider names in canonical order.
    pub fn list(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Where `name` came from.
    pub fn origin(&self, name: &str) -> Option<Origin> {
        self.find(name).map(|e| e.origin)
    }

    /// The validated definition of a declarative provider.
    pub fn definition(&self, name: &str) -> Option<&ProviderDefinition> {
        match &self.find(name)?.entry {
            Entry::Declarative(definition) => Some(definition),
            Entry::Capability(_) => None,
        }
    }

    /// Definitions dropped during load.
    pub fn rejected(&self) -> &[RejectedDefinition] {
        &self.rejected
    }

    /// Summaries of every provider, in canonical order.
    pub fn describe(&self) -> Vec<ProviderInfo> {
        self.entries
            .iter()
            .map(|e| match &e.entry {
                Entry::Declarative(d) => ProviderInfo {
                    name: e.name.clone(),
                    origin: e.origin,
                    base_url: Some(d.base_url.clone()),
                    api_key_env: Some(d.api_key_env.clone()),
                    supports_credits: d.supports_credits(),
                },
                Entry::Capability(c) => ProviderInfo {
                    name: e.name.clone(),
                    origin: e.origin,
                    base_url: None,
                    api_key_env: None,
                    supports_credits: c.supports_credits(),
                },
            })
            .collect()
    }

    /// Returns the user definition file, if one is configured.
    pub fn user_source(&self) -> Option<&Path> {
        self.user_source.as_deref()
    }

    fn find(&self, name: &str) -> Option<&Registered> {
        self.entries.iter().find(|e| e.name == name)
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Resolves `name` to a capability.
    ///
    /// For declarative providers the API key is read now; an unset variable
    /// fails before any network attempt.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ProviderCapability>, ProviderError> {
        let registered = self
            .find(name)
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))?;

        match &registered.entry {
            Entry::Capability(capability) => Ok(Arc::clone(capability)),
            Entry::Declarative(definition) => {
                let api_key = self.credentials.lookup(&definition.api_key_env).ok_or_else(|| {
                    ProviderError::MissingCredential {
                        provider: definition.name.clone(),
                        env_var: definition.api_key_env.clone(),
                    }
                })?;
                Ok(Arc::new(self.generic(definition.clone(), api_key)))
            }
        }
    }

    /// Resolves `name` with an explicit API key, skipping the lookup.
    pub fn resolve_with_key(
        &self,
        name: &str,
        api_key: &str,
    ) -> Result<Arc<dyn ProviderCapability>, ProviderError> {
        let registered = self
            .find(name)
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))?;

        match &registered.entry {
            Entry::Capability(capability) => Ok(Arc::clone(capability)),
            Entry::Declarative(definition) => Ok(Arc::new(self.generic(definition.clone(), api_key))),
        }
    }

    fn generic(&self, definition: ProviderDefinition, api_key: impl Into<String>) -> GenericProvider {
        let provider = GenericProvider::new(definition, api_key, Arc::clone(&self.http));
        match self.default_ttl {
            Some(ttl) => provider.with_default_ttl(ttl),
            None => provider,
        }
    }

    // ------------------------------------------------------------------------
    // Stage & Commit
    // ------------------------------------------------------------------------

    /// Validates a candidate and performs one live, uncached models call.
    ///
    /// Nothing is persisted and the registry is not modified. The key is
    /// `api_key_override` when given, else read through the credential
    /// source.
    #[instrument(skip(self, candidate, api_key_override))]
    pub async fn stage(
        &self,
        candidate: DefinitionRecord,
        api_key_override: Option<&str>,
    ) -> TestReport {
        let provider = candidate
            .effective_name(None)
            .unwrap_or("<unnamed>")
            .to_string();
        let base_url = candidate.base_url.clone().unwrap_or_default();

        let definition = match candidate.validate(None) {
            Ok(definition) => definition,
            Err(error) => {
                info!(provider = %provider, error = %error, "Candidate failed validation");
                return TestReport {
                    provider,
                    base_url,
                    outcome: Err(error),
                };
            }
        };

        let api_key = api_key_override
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| self.credentials.lookup(&definition.api_key_env));

        let outcome = match api_key {
            Some(api_key) => self.generic(definition.clone(), api_key).fetch_models().await,
            None => Err(ProviderError::MissingCredential {
                provider: definition.name.clone(),
                env_var: definition.api_key_env.clone(),
            }),
        };

        match &outcome {
            Ok(models) => info!(provider = %definition.name, models = models.len(), "Candidate passed"),
            Err(error) => info!(provider = %definition.name, error = %error, "Candidate failed"),
        }

        TestReport {
            provider: definition.name,
            base_url: definition.base_url,
            outcome,
        }
    }

    /// Persists a candidate into the user definition file.
    ///
    /// Fails with [`ProviderError::Duplicate`] if the file already defines
    /// the name (shadowing a built-in is allowed). The file is rewritten
    /// atomically. The in-memory registry is not changed; reload to see the
    /// new provider.
    #[instrument(skip(self, candidate))]
    pub async fn commit(&self, candidate: DefinitionRecord) -> Result<ProviderDefinition, ProviderError> {
        let definition = candidate.validate(None)?;

        let path = self.user_source.as_deref().ok_or_else(|| ProviderError::Storage {
            provider: definition.name.clone(),
            message: "no user definition file configured".to_string(),
        })?;
        let label = path.display().to_string();

        let existing = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(ProviderError::Storage {
                    provider: definition.name.clone(),
                    message: format!("{label}: {e}"),
                });
            }
        };

        let updated = append_definition(&existing, &label, &definition.name, &definition.to_record())?;

        llminfo_store::write_atomic(path, updated.as_bytes())
            .await
            .map_err(|e| ProviderError::Storage {
                provider: definition.name.clone(),
                message: format!("{label}: {e}"),
            })?;

        info!(provider = %definition.name, path = %label, "Provider definition committed");
        Ok(definition)
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.list())
            .field("rejected", &self.rejected.len())
            .field("user_source", &self.user_source)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

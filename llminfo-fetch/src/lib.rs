// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # llminfo Fetch
//!
//! HTTP host API and the provider capability abstraction.
//!
//! ## Host APIs
//!
//! - [`host::http`] - Bearer-authenticated JSON GET with a fixed timeout.
//!   Statuses are classified once, here: 401, 429, other non-2xx.
//!
//! ## Capabilities
//!
//! - [`capability::ProviderCapability`] - Trait every provider implements
//! - [`credentials::CredentialSource`] - Where API keys come from
//! - [`context::FetchSettings`] - Request timeout
//!
//! ## Example
//!
//! ```ignore
//! use llminfo_fetch::FetchSettings;
//!
//! let client = FetchSettings::default().http_client()?;
//! let body = client.get_json("https://api.groq.com/openai/v1/models", &key).await?;
//! ```

// Core modules
pub mod capability;
pub mod context;
pub mod credentials;
pub mod error;
pub mod host;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Errors
pub use error::FetchError;

// Host APIs
pub use host::http::{HttpClient, ResponseExt, classify_status};

// Capabilities
pub use capability::ProviderCapability;
pub use context::FetchSettings;
pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials};

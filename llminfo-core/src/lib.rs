// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # llminfo Core
//!
//! Types shared by every llminfo crate.
//!
//! ## Key Types
//!
//! ### Canonical Records
//! - [`ModelRecord`] - A model, normalized across providers
//! - [`CreditRecord`] - Credit balance with derived `remaining`
//!
//! ### Provider Definitions
//! - [`DefinitionRecord`] - Unvalidated definition as read from a file
//! - [`ProviderDefinition`] - Validated definition
//! - [`ParserKind`] - Response parsing strategy key
//!
//! ### Errors
//! - [`ProviderError`] - Every failure the engine reports, per provider
//! - [`ErrorKind`] - Coarse classification of a [`ProviderError`]

pub mod error;
pub mod models;

// Re-export error types
pub use error::{ErrorKind, ProviderError};

// Re-export all model types
pub use models::{
    // Records
    CreditRecord,
    FREE_MODEL_SUFFIX,
    ModelRecord,
    Pricing,
    is_free_model,
    // Definitions
    DEFAULT_CACHE_TTL,
    DefinitionRecord,
    ParserKind,
    ProviderDefinition,
    // Selection
    PREFERRED_MIN_CONTEXT,
    select_best_free_model,
};

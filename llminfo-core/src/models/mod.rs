//! Canonical data model.
//!
//! - [`ModelRecord`] and [`CreditRecord`]: the normalized shapes every
//!   parser converges on
//! - [`ProviderDefinition`] and [`DefinitionRecord`]: declarative provider
//!   configuration, validated and raw
//! - [`select_best_free_model`]: picks a free model for agentic use

mod credit;
mod definition;
mod model;
mod selection;


pub use credit::CreditRecord;
pub use definition::{DEFAULT_CACHE_TTL, DefinitionRecord, ParserKind, ProviderDefinition};
pub use model::{FREE_MODEL_SUFFIX, ModelRecord, Pricing, is_free_model};
pub use selection::{PREFERRED_MIN_CONTEXT, select_best_free_model};

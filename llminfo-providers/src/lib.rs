// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # llminfo Providers
//!
//! Provider registry, response parsers, and query orchestration.
//!
//! Providers are described declaratively in YAML and served by a single
//! generic client. A new OpenAI-compatible provider needs only a new
//! definition.
//!
//! - **Definitions**: built-in and user YAML sources
//! - **Parsers**: one strategy per payload shape, selected by key
//! - **Registry**: merged, validated definitions plus code capabilities
//! - **Query**: cache-aware, concurrent model and credit queries
//!
//! ## Built-in Providers
//!
//! | Provider | Parser | Credits |
//! |----------|--------|---------|
//! | OpenRouter | `openrouter` | ✅ |
//! | Groq | `openai_compatible` | ❌ |
//! | Cerebras | `openai_compatible` | ❌ |
//! | OpenAI | `openai_compatible` | ❌ |
//!
//! ## Usage
//!
//! ```ignore
//! use llminfo_providers::{ProviderRegistry, QueryEngine};
//! use llminfo_store::CacheStore;
//!
//! let registry = ProviderRegistry::load_with_user_file(&user_path).await?;
//! let cache = CacheStore::new(cache_dir);
//!
//! for result in QueryEngine::new(&registry, &cache).query_all_models().await {
//!     match result.outcome {
//!         Ok(fetched) => println!("{}: {} models", result.provider, fetched.value.len()),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

pub mod definitions;
pub mod generic;
pub mod parser;
pub mod query;
pub mod registry;

pub use definitions::{
    BUILTIN_DEFINITIONS, append_definition, parse_candidate, parse_source, read_candidate_file,
};
pub use generic::GenericProvider;
pub use parser::{OpenAiCompatibleParser, OpenRouterParser, ParseError, ResponseParser, parser_for};
pub use query::{Fetched, QueryEngine, QueryOptions, QueryResult, Source};
pub use registry::{Origin, ProviderInfo, ProviderRegistry, RejectedDefinition, TestReport};

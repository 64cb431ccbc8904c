//! # Stego - In-path prompt compression for LLM APIs
//!
//! Shrinks the human-authored prompt text of LLM API requests with a
//! reversible, word-boundary-safe dictionary substitution, while leaving
//! every other byte of the JSON document alone.
//!
//! ## Features
//!
//! - **Schema detection**: OpenAI, Anthropic and Gemini endpoints recognised by URL
//! - **Precise rewriting**: only the latest user turn (or prompt) is touched
//! - **Reversible dictionary**: longest-match-first phrase→token substitution
//! - **Custom rules**: JSON rule files merged over the built-in table
//! - **Hot reconfiguration**: strategy, learned stage and rules swap atomically
//! - **Never blocks traffic**: every failure degrades to pass-through
//!
//! ## Architecture
//!
//! ```text
//! transport ──(url, body)──> Interceptor ──> SchemaRegistry::detect
//!                                 │
//!                                 ├──> locate_request_text / locate_response_text
//!                                 │
//!                                 ├──> StegoEngine::compress (snapshot)
//!                                 │
//!                                 └──> FieldPath::set ──> RewriteResult {body, content_length}
//! ```
//!
//! ### Pipeline outcomes
//!
//! | Outcome          | Body forwarded      | Logged at |
//! |------------------|---------------------|-----------|
//! | Rewritten        | re-serialised JSON  | info      |
//! | NoSchema         | original bytes      | debug     |
//! | InvalidBody      | original bytes      | warn      |
//! | TextNotFound     | original bytes      | warn      |
//! | Unchanged        | original bytes      | -         |
//! | WriteBackFailed  | original bytes      | warn      |
//!
//! ## Quick Start
//!
//! ### Text only
//!
//! ```rust,ignore
//! use stego::StegoEngine;
//!
//! let engine = StegoEngine::new();
//! let compressed = engine.compress("Explain how a hash map works in Rust");
//! assert_eq!(compressed, "EH: a hash map works in RS");
//! assert_eq!(engine.decompress(&compressed), "Explain how a hash map works in Rust");
//! ```
//!
//! ### Full pipeline
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stego::{Interceptor, StegoEngine};
//!
//! let interceptor = Interceptor::new(Arc::new(StegoEngine::new()));
//! let body = r#"{"model":"gpt-4o","messages":[{"role":"user","content":"Write a function"}]}"#;
//!
//! let result = interceptor.on_request("https://api.openai.com/v1/chat/completions", body);
//! assert!(result.is_rewritten());
//! assert_eq!(result.content_length, result.body.len());
//! ```
//!
//! ## Modules
//!
//! - [`codec`]: Dictionary table, substitution and strategies
//! - [`schema`]: Vendor schema detection and text location
//! - [`proxy`]: Interception pipeline and metrics
//! - [`server`]: Admin HTTP API (Axum-based)
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod codec;
pub mod config;
pub mod error;
pub mod proxy;
pub mod schema;
pub mod server;

// Re-exports for convenience
pub use codec::{CustomRules, DictionaryTable, RulesSource, StegoEngine, Strategy, StrategyKind};
pub use config::Config;
pub use error::{Result, StegoError};
pub use proxy::{Interceptor, MetricsSummary, Outcome, PassThroughReason, RewriteResult};
pub use schema::{FieldPath, LocatedText, SchemaId, SchemaRegistry};
pub use server::{AppState, Server, ServerConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Reversible dictionary compression for prompt text.
//!
//! # Pipeline
//!
//! ```text
//! BUILTIN_RULES ─┐
//!                ├─> DictionaryTable ──> Strategy ──> StegoEngine
//! CustomRules ───┘    (compress view,     (dictionary   (snapshot swap,
//!                      decompress view)    | learned)    best-effort)
//! ```
//!
//! # Matching rules
//!
//! | Rule                 | Behaviour                                         |
//! |----------------------|---------------------------------------------------|
//! | Longest first        | `Write a function` wins over `function`           |
//! | Word boundaries      | `class` never matches inside `subclass`           |
//! | Sequential passes    | each rule runs over the previous rule's output    |
//! | Best effort          | a failing strategy returns the input unchanged    |
//!
//! # Usage
//!
//! ```rust,ignore
//! use stego::codec::StegoEngine;
//!
//! let engine = StegoEngine::new();
//! let compressed = engine.compress("Write a function in Python");
//! assert_eq!(compressed, "WF: in PY");
//! assert_eq!(engine.decompress(&compressed), "Write a function in Python");
//! ```

mod engine;
mod strategy;
pub mod substitute;
mod table;
mod tables;

pub use engine::{EngineSnapshot, RulesSource, StegoEngine};
pub use strategy::{DictionaryStrategy, LearnedStrategy, Strategy, StrategyKind};
pub use table::{CustomDictionary, CustomRule, CustomRules, DictionaryRule, DictionaryTable};
pub use tables::BUILTIN_RULES;

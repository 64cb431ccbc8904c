//! Compression strategies and their static registry.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::substitute;
use super::table::DictionaryTable;
use crate::error::Result;

/// A reversible text transformation.
pub trait Strategy: Send + Sync {
    /// Registry name of this strategy
    fn name(&self) -> &'static str;

    /// Shrink `text`
    fn compress(&self, text: &str) -> Result<String>;

    /// Undo [`Strategy::compress`]
    fn decompress(&self, text: &str) -> Result<String>;
}

/// Closed set of known strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Dictionary substitution
    #[default]
    Dictionary,
    /// Learned compression (placeholder stage)
    Learned,
}

impl StrategyKind {
    /// Look up a strategy by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "dictionary" | "dict" => Some(StrategyKind::Dictionary),
            "learned" | "deep_learning" => Some(StrategyKind::Learned),
            _ => None,
        }
    }

    /// Look up a strategy by name, falling back to the default
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_default()
    }

    /// Registry name
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Dictionary => "dictionary",
            StrategyKind::Learned => "learned",
        }
    }

    /// All registered strategies
    pub fn all() -> &'static [StrategyKind] {
        &[StrategyKind::Dictionary, StrategyKind::Learned]
    }

    /// Construct the strategy over `table`
    pub fn build(&self, table: &Arc<DictionaryTable>) -> Arc<dyn Strategy> {
        match self {
            StrategyKind::Dictionary => Arc::new(DictionaryStrategy::new(Arc::clone(table))),
            StrategyKind::Learned => Arc::new(LearnedStrategy),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Phrase substitution driven by a [`DictionaryTable`].
#[derive(Debug, Clone)]
pub struct DictionaryStrategy {
    table: Arc<DictionaryTable>,
}

impl DictionaryStrategy {
    /// Create over a table
    pub fn new(table: Arc<DictionaryTable>) -> Self {
        Self { table }
    }

    /// Create over the built-in table
    pub fn builtin() -> Self {
        Self::new(Arc::new(DictionaryTable::builtin()))
    }

    /// Table in use
    pub fn table(&self) -> &DictionaryTable {
        &self.table
    }
}

impl Strategy for DictionaryStrategy {
    fn name(&self) -> &'static str {
        StrategyKind::Dictionary.name()
    }

    fn compress(&self, text: &str) -> Result<String> {
        Ok(substitute::apply(text, self.table.compress_map()))
    }

    fn decompress(&self, text: &str) -> Result<String> {
        Ok(substitute::apply(text, self.table.decompress_map()))
    }
}

/// Hook for a learned compression stage.
///
/// No model ships with this crate, so both directions are the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LearnedStrategy;

impl Strategy for LearnedStrategy {
    fn name(&self) -> &'static str {
        StrategyKind::Learned.name()
    }

    fn compress(&self, text: &str) -> Result<String> {
        tracing::debug!("Learned stage has no model loaded, passing text through");
        Ok(text.to_string())
    }

    fn decompress(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

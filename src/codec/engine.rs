//! Compression engine with hot-swappable rules and strategy.
//!
//! The engine never fails a caller: [`StegoEngine::compress`] and
//! [`StegoEngine::decompress`] hand back the input when the active strategy
//! errors. Admin actions (strategy selection, learned-stage toggle,
//! dictionary reload) build a fresh [`EngineSnapshot`] and swap it in
//! whole, so a call in flight finishes against the snapshot it started
//! with.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use super::strategy::{Strategy, StrategyKind};
use super::table::{CustomRules, DictionaryTable};
use crate::config::{CompressionConfig, CustomRulesConfig};
use crate::error::Result;

/// Where to read custom rules from.
#[derive(Debug, Clone)]
pub enum RulesSource {
    /// JSON file on disk
    Path(PathBuf),
    /// Raw JSON text
    Json(String),
    /// Already parsed rules
    Rules(CustomRules),
}

impl RulesSource {
    fn resolve(self) -> Result<CustomRules> {
        match self {
            RulesSource::Path(path) => CustomRules::from_file(path),
            RulesSource::Json(json) => CustomRules::from_json(&json),
            RulesSource::Rules(rules) => Ok(rules),
        }
    }
}

impl From<PathBuf> for RulesSource {
    fn from(path: PathBuf) -> Self {
        RulesSource::Path(path)
    }
}

impl From<CustomRules> for RulesSource {
    fn from(rules: CustomRules) -> Self {
        RulesSource::Rules(rules)
    }
}

/// Immutable engine state.
pub struct EngineSnapshot {
    /// Live dictionary table
    pub table: Arc<DictionaryTable>,
    /// Strategy name as requested by the operator
    pub requested: String,
    /// Strategy actually in use
    pub kind: StrategyKind,
    primary: Arc<dyn Strategy>,
    learned: Option<Arc<dyn Strategy>>,
}

/// Registry lookup with default fallback, warning on unknown names
fn resolve_strategy(name: &str) -> StrategyKind {
    StrategyKind::from_name(name).unwrap_or_else(|| {
        tracing::warn!(
            "Unknown strategy '{}', falling back to {}",
            name,
            StrategyKind::default()
        );
        StrategyKind::default()
    })
}

impl EngineSnapshot {
    fn build(
        table: Arc<DictionaryTable>,
        requested: String,
        kind: StrategyKind,
        learned_enabled: bool,
    ) -> Self {
        let primary = kind.build(&table);
        let learned = learned_enabled.then(|| StrategyKind::Learned.build(&table));

        Self {
            table,
            requested,
            kind,
            primary,
            learned,
        }
    }

    /// Whether the learned stage runs
    pub fn learned_enabled(&self) -> bool {
        self.learned.is_some()
    }

    fn compress(&self, text: &str) -> Result<String> {
        let staged = match &self.learned {
            Some(learned) => learned.compress(text)?,
            None => text.to_string(),
        };
        self.primary.compress(&staged)
    }

    fn decompress(&self, text: &str) -> Result<String> {
        let restored = self.primary.decompress(text)?;
        match &self.learned {
            Some(learned) => learned.decompress(&restored),
            None => Ok(restored),
        }
    }
}

impl std::fmt::Debug for EngineSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSnapshot")
            .field("rules", &self.table.len())
            .field("requested", &self.requested)
            .field("kind", &self.kind)
            .field("learned", &self.learned_enabled())
            .finish()
    }
}

/// Thread-safe compression engine.
#[derive(Debug)]
pub struct StegoEngine {
    state: RwLock<Arc<EngineSnapshot>>,
}

impl Default for StegoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StegoEngine {
    /// Engine over the built-in table with the dictionary strategy
    pub fn new() -> Self {
        Self::with_table(DictionaryTable::builtin())
    }

    /// Engine over a specific table
    pub fn with_table(table: DictionaryTable) -> Self {
        let kind = StrategyKind::default();
        let snapshot = EngineSnapshot::build(Arc::new(table), kind.name().to_string(), kind, false);
        Self {
            state: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Build from configuration, merging the custom rules file if enabled
    pub fn from_config(compression: &CompressionConfig, custom: &CustomRulesConfig) -> Self {
        let mut table = DictionaryTable::builtin();

        if custom.enabled {
            if let Some(path) = &custom.path {
                match CustomRules::from_file(path) {
                    Ok(rules) => {
                        table.load(rules.to_rules());
                        tracing::info!("Loaded {} custom rules from {}", rules.len(), path.display());
                    },
                    Err(e) => tracing::warn!("Custom rules not loaded: {}", e),
                }
            }
        }

        let snapshot = EngineSnapshot::build(
            Arc::new(table),
            compression.strategy.clone(),
            resolve_strategy(&compression.strategy),
            compression.learned_enabled,
        );
        Self {
            state: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the snapshot; the write lock is held while `f` runs so
    /// concurrent admin actions apply one after another.
    fn update(&self, f: impl FnOnce(&EngineSnapshot) -> EngineSnapshot) -> Arc<EngineSnapshot> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(f(&guard));
        *guard = Arc::clone(&next);
        next
    }

    /// Compress with the active strategy, returning the input on failure
    pub fn compress(&self, text: &str) -> String {
        match self.try_compress(text) {
            Ok(compressed) => compressed,
            Err(e) => {
                tracing::warn!("Compression failed, keeping original text: {}", e);
                text.to_string()
            },
        }
    }

    /// Decompress with the active strategy, returning the input on failure
    pub fn decompress(&self, text: &str) -> String {
        match self.try_decompress(text) {
            Ok(restored) => restored,
            Err(e) => {
                tracing::warn!("Decompression failed, keeping original text: {}", e);
                text.to_string()
            },
        }
    }

    /// Compress, surfacing strategy errors
    pub fn try_compress(&self, text: &str) -> Result<String> {
        let snapshot = self.snapshot();
        tracing::debug!("Applying {} compression", snapshot.kind);
        snapshot.compress(text)
    }

    /// Decompress, surfacing strategy errors
    pub fn try_decompress(&self, text: &str) -> Result<String> {
        let snapshot = self.snapshot();
        tracing::debug!("Applying {} decompression", snapshot.kind);
        snapshot.decompress(text)
    }

    /// Transform an LLM response on its way back.
    ///
    /// Responses carry model-authored text, so nothing is rewritten yet.
    pub fn transform_response(&self, text: &str) -> String {
        text.to_string()
    }

    /// Select a strategy by name.
    ///
    /// Unknown names fall back to the default strategy; the requested name
    /// is still kept for display.
    pub fn select_strategy(&self, name: &str) -> StrategyKind {
        let kind = resolve_strategy(name);
        let next = self.update(|current| {
            EngineSnapshot::build(
                Arc::clone(&current.table),
                name.to_string(),
                kind,
                current.learned_enabled(),
            )
        });
        tracing::info!("Compression strategy set to '{}' (active: {})", name, next.kind);
        next.kind
    }

    /// Enable or disable the learned stage
    pub fn set_learned_enabled(&self, enabled: bool) {
        self.update(|current| {
            EngineSnapshot::build(
                Arc::clone(&current.table),
                current.requested.clone(),
                current.kind,
                enabled,
            )
        });
        tracing::info!(
            "Learned compression {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Merge custom rules into the live table.
    ///
    /// On a missing or malformed source the table is left as it was and
    /// the error is returned for display. Returns the new rule count.
    pub fn reload_dictionary(&self, source: impl Into<RulesSource>) -> Result<usize> {
        let rules = match source.into().resolve() {
            Ok(rules) => rules,
            Err(e) => {
                tracing::warn!("Dictionary reload skipped: {}", e);
                return Err(e);
            },
        };

        let next = self.update(|current| {
            let table = current.table.merge(rules.to_rules());
            EngineSnapshot::build(
                Arc::new(table),
                current.requested.clone(),
                current.kind,
                current.learned_enabled(),
            )
        });

        tracing::info!(
            "Dictionary reloaded: {} custom entries, {} rules total",
            rules.len(),
            next.table.len()
        );
        Ok(next.table.len())
    }

    /// Strategy name as last requested
    pub fn strategy_name(&self) -> String {
        self.snapshot().requested.clone()
    }

    /// Strategy in use
    pub fn active_strategy(&self) -> StrategyKind {
        self.snapshot().kind
    }

    /// Whether the learned stage runs
    pub fn learned_enabled(&self) -> bool {
        self.snapshot().learned_enabled()
    }

    /// Live dictionary table
    pub fn table(&self) -> Arc<DictionaryTable> {
        Arc::clone(&self.snapshot().table)
    }
}

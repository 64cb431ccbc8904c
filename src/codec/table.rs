//! Dictionary table: ordered phrase → token rules with a matching inverse.
//!
//! A [`DictionaryTable`] keeps one canonical rule list and derives both
//! directions from it, so every compress entry has exactly one decompress
//! inverse. Tables are values: merging returns a new table and the old one
//! stays valid for anyone still holding it.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::tables::BUILTIN_RULES;
use crate::error::{Result, StegoError};

lazy_static::lazy_static! {
    /// Built-in table, compiled once.
    static ref BUILTIN_TABLE: DictionaryTable = {
        let mut table = DictionaryTable::empty();
        table.load(BUILTIN_RULES.entries().map(|(p, t)| DictionaryRule::new(*p, *t)));
        table
    };
}

/// A single phrase → token substitution rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryRule {
    /// Text matched in prompts
    pub pattern: String,
    /// Short form substituted for the pattern
    pub token: String,
}

impl DictionaryRule {
    /// Create a new rule
    pub fn new(pattern: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            token: token.into(),
        }
    }

    fn is_valid(&self) -> bool {
        !self.pattern.is_empty() && !self.token.is_empty()
    }
}

/// Bidirectional substitution table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryTable {
    /// Canonical rules, oldest writer first
    rules: Vec<DictionaryRule>,
    /// pattern → token, longest pattern first
    compress: Vec<(String, String)>,
    /// token → pattern, longest token first
    decompress: Vec<(String, String)>,
}

impl DictionaryTable {
    /// Table with no rules
    pub fn empty() -> Self {
        Self::default()
    }

    /// Table holding the built-in rules
    pub fn builtin() -> Self {
        BUILTIN_TABLE.clone()
    }

    /// Load rules into this table.
    ///
    /// A rule whose pattern is already present replaces the earlier one
    /// and becomes the latest writer. Re-applying an unchanged rule makes it
    /// the latest writer of its token again. Loading the same rules again
    /// leaves the table unchanged.
    pub fn load(&mut self, rules: impl IntoIterator<Item = DictionaryRule>) {
        let mut changed = false;

        for rule in rules {
            if !rule.is_valid() {
                tracing::warn!("Skipping dictionary rule with empty pattern or token");
                continue;
            }

            match self.rules.iter().position(|r| r.pattern == rule.pattern) {
                Some(idx) if self.rules[idx].token == rule.token => {
                    let shadowed = self.rules[idx + 1..].iter().any(|r| r.token == rule.token);
                    if !shadowed {
                        continue;
                    }
                    self.rules.remove(idx);
                },
                Some(idx) => {
                    self.rules.remove(idx);
                },
                None => {},
            }

            self.rules.push(rule);
            changed = true;
        }

        if changed {
            self.rebuild_views();
        }
    }

    /// Merge rules into a copy of this table.
    ///
    /// Additive: existing rules are only ever overridden, never removed.
    pub fn merge(&self, rules: impl IntoIterator<Item = DictionaryRule>) -> Self {
        let mut merged = self.clone();
        merged.load(rules);
        merged
    }

    /// Compress-direction entries (pattern, token), longest pattern first
    pub fn compress_map(&self) -> &[(String, String)] {
        &self.compress
    }

    /// Decompress-direction entries (token, pattern), longest token first
    pub fn decompress_map(&self) -> &[(String, String)] {
        &self.decompress
    }

    /// Canonical rule list in writer order
    pub fn rules(&self) -> &[DictionaryRule] {
        &self.rules
    }

    /// Token for a pattern
    pub fn token_for(&self, pattern: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.pattern == pattern)
            .map(|r| r.token.as_str())
    }

    /// Pattern a token expands to
    pub fn pattern_for(&self, token: &str) -> Option<&str> {
        self.decompress
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, p)| p.as_str())
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the table has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn rebuild_views(&mut self) {
        self.compress = self
            .rules
            .iter()
            .map(|r| (r.pattern.clone(), r.token.clone()))
            .collect();
        sort_longest_first(&mut self.compress);

        // Later writers win on shared tokens.
        let mut inverse: HashMap<&str, &str> = HashMap::with_capacity(self.rules.len());
        for rule in &self.rules {
            inverse.insert(rule.token.as_str(), rule.pattern.as_str());
        }
        self.decompress = inverse
            .into_iter()
            .map(|(t, p)| (t.to_string(), p.to_string()))
            .collect();
        sort_longest_first(&mut self.decompress);
    }
}

/// Sort by descending key length in chars, ties broken by key.
fn sort_longest_first(entries: &mut [(String, String)]) {
    entries.sort_by(|a, b| {
        b.0.chars()
            .count()
            .cmp(&a.0.chars().count())
            .then_with(|| a.0.cmp(&b.0))
    });
}

/// A `{pattern, replacement}` entry of a custom rules file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    /// Text to match
    #[serde(default)]
    pub pattern: String,
    /// Token to substitute
    #[serde(default)]
    pub replacement: String,
}

/// A named group of entries in a custom rules file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDictionary {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// pattern → token, in file order
    #[serde(default)]
    pub entries: IndexMap<String, String>,
}

/// User-supplied rules, as stored in the custom rules JSON file.
///
/// ```json
/// {
///   "rules": [{"pattern": "custom pattern", "replacement": "CP:"}],
///   "dictionaries": [{"name": "team", "entries": {"custom entry": "CE"}}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRules {
    /// Individual rules, applied in file order
    #[serde(default)]
    pub rules: Vec<CustomRule>,
    /// Named dictionaries, applied after `rules`
    #[serde(default)]
    pub dictionaries: Vec<CustomDictionary>,
}

impl CustomRules {
    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| StegoError::CustomRules(format!("Malformed custom rules: {e}")))
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StegoError::CustomRules(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Write to a JSON file, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Flatten into dictionary rules in application order
    pub fn to_rules(&self) -> Vec<DictionaryRule> {
        let singles = self
            .rules
            .iter()
            .map(|r| DictionaryRule::new(r.pattern.as_str(), r.replacement.as_str()));
        let grouped = self.dictionaries.iter().flat_map(|d| {
            d.entries
                .iter()
                .map(|(p, t)| DictionaryRule::new(p.as_str(), t.as_str()))
        });
        singles.chain(grouped).collect()
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.rules.len() + self.dictionaries.iter().map(|d| d.entries.len()).sum::<usize>()
    }

    /// Check if there are no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_sorted_longest_first() {
        let table = DictionaryTable::builtin();
        assert_eq!(table.len(), BUILTIN_RULES.len());

        let lengths: Vec<usize> = table
            .compress_map()
            .iter()
            .map(|(p, _)| p.chars().count())
            .collect();
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(table.compress_map()[0].0, "Implement a function");
    }

    #[test]
    fn test_every_pattern_has_inverse() {
        let table = DictionaryTable::builtin();
        for rule in table.rules() {
            assert_eq!(table.pattern_for(&rule.token), Some(rule.pattern.as_str()));
        }
        assert_eq!(table.decompress_map().len(), table.compress_map().len());
    }

    #[test]
    fn test_load_is_idempotent() {
        let mut table = DictionaryTable::builtin();
        let before = table.clone();
        table.load(BUILTIN_RULES.entries().map(|(p, t)| DictionaryRule::new(*p, *t)));
        assert_eq!(table, before);
    }

    #[test]
    fn test_merge_overrides_pattern() {
        let table = DictionaryTable::builtin();
        let merged = table.merge([DictionaryRule::new("function", "FN")]);

        assert_eq!(merged.len(), table.len());
        assert_eq!(merged.token_for("function"), Some("FN"));
        assert_eq!(merged.pattern_for("FN"), Some("function"));
        // The replaced token no longer expands.
        assert_eq!(merged.pattern_for("fn"), None);
        // Original table untouched.
        assert_eq!(table.token_for("function"), Some("fn"));
    }

    #[test]
    fn test_merge_twice_same_result() {
        let custom = [
            DictionaryRule::new("custom pattern", "CP:"),
            DictionaryRule::new("function", "FN"),
        ];
        let once = DictionaryTable::builtin().merge(custom.clone());
        let twice = once.merge(custom);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_shared_token_last_writer_wins() {
        let table = DictionaryTable::empty().merge([
            DictionaryRule::new("alpha", "X"),
            DictionaryRule::new("beta", "X"),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.decompress_map().len(), 1);
        assert_eq!(table.pattern_for("X"), Some("beta"));
    }

    #[test]
    fn test_reapplied_rule_becomes_latest_writer() {
        let table = DictionaryTable::empty()
            .merge([DictionaryRule::new("alpha", "X")])
            .merge([DictionaryRule::new("beta", "X")])
            .merge([DictionaryRule::new("alpha", "X")]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.pattern_for("X"), Some("alpha"));
    }

    #[test]
    fn test_shared_token_source_merged_twice() {
        let shared = [DictionaryRule::new("alpha", "X"), DictionaryRule::new("beta", "X")];
        let once = DictionaryTable::empty().merge(shared.clone());
        let twice = once.merge(shared);

        assert_eq!(once, twice);
        assert_eq!(twice.pattern_for("X"), Some("beta"));
    }

    #[test]
    fn test_dictionary_entries_keep_file_order() {
        let custom = CustomRules::from_json(
            r#"{"dictionaries": [{"name": "d", "entries": {"zeta": "ZZ", "alpha": "ZZ"}}]}"#,
        )
        .unwrap();

        assert_eq!(
            custom.to_rules(),
            vec![DictionaryRule::new("zeta", "ZZ"), DictionaryRule::new("alpha", "ZZ")]
        );
        let table = DictionaryTable::empty().merge(custom.to_rules());
        assert_eq!(table.pattern_for("ZZ"), Some("alpha"));

        let saved = serde_json::to_string(&custom).unwrap();
        assert!(saved.find("zeta").unwrap() < saved.find("alpha").unwrap());
    }

    #[test]
    fn test_empty_rules_skipped() {
        let table = DictionaryTable::empty().merge([
            DictionaryRule::new("", "X"),
            DictionaryRule::new("alpha", ""),
        ]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_custom_rules_parse() {
        let json = r#"{
            "rules": [
                {"pattern": "custom pattern", "replacement": "CP:"},
                {"pattern": "another custom", "replacement": "AC:"}
            ],
            "dictionaries": [
                {"name": "test_dict", "entries": {"custom entry": "CE", "another entry": "AE"}}
            ]
        }"#;

        let custom = CustomRules::from_json(json).unwrap();
        assert_eq!(custom.len(), 4);

        let rules = custom.to_rules();
        assert_eq!(rules[0], DictionaryRule::new("custom pattern", "CP:"));
        assert_eq!(rules[1], DictionaryRule::new("another custom", "AC:"));
        assert_eq!(rules.len(), 4);
    }

    #[test]
    fn test_custom_rules_sections_optional() {
        let only_dicts = CustomRules::from_json(r#"{"dictionaries": []}"#).unwrap();
        assert!(only_dicts.is_empty());

        let empty = CustomRules::from_json("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_custom_rules_malformed() {
        let err = CustomRules::from_json(r#"{"rules": "nope"}"#).unwrap_err();
        assert!(matches!(err, StegoError::CustomRules(_)));
    }
}

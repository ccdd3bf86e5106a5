//! Event-name alias tables, loaded from YAML rather than compiled in.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::CoreError;

const BUNDLED_ALIASES: &str = include_str!("../config/aliases.yaml");

/// One locator alias group: a canonical key and the names it is known by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceGroup {
    pub key: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl RaceGroup {
    /// Whether a lowercase hint refers to this group: it names the key or one
    /// of the aliases as a whole word.
    pub fn matches_hint(&self, hint: &str) -> bool {
        self.names().any(|name| contains_word(hint, name))
    }

    /// Whether lowercase upstream text (a location or country) names this group.
    pub fn matches_text(&self, text: &str) -> bool {
        !text.is_empty() && self.names().any(|name| contains_word(text, name))
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Substring match anchored on word boundaries, so `spa` finds
/// `spa-francorchamps` but not `spain`.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Alias data used by the batch client and the session locator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTable {
    /// Hint → archive event name rewrites.
    #[serde(default)]
    pub event_names: BTreeMap<String, String>,
    /// Locator fallback groups, walked in file order.
    #[serde(default)]
    pub race_groups: Vec<RaceGroup>,
}

impl AliasTable {
    /// The table shipped with the crate.
    pub fn bundled() -> Result<Self, CoreError> {
        Self::from_yaml_str(BUNDLED_ALIASES)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
            .map_err(|error| CoreError::Config(format!("{}: {error}", path.display())))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, CoreError> {
        let mut table: Self =
            serde_yaml::from_str(raw).map_err(|error| CoreError::Config(error.to_string()))?;
        table.normalize();
        Ok(table)
    }

    fn normalize(&mut self) {
        for group in &mut self.race_groups {
            group.key = group.key.trim().to_lowercase();
            group.aliases = group
                .aliases
                .iter()
                .map(|alias| alias.trim().to_lowercase())
                .filter(|alias| !alias.is_empty())
                .collect();
        }
        self.race_groups.retain(|group| !group.key.is_empty());
    }

    /// Rewrites a user hint into the archive's naming; unknown hints pass
    /// through unchanged.
    pub fn rewrite_event_name<'a>(&'a self, hint: &'a str) -> &'a str {
        let trimmed = hint.trim();
        self.event_names
            .iter()
            .find(|(from, _)| from.eq_ignore_ascii_case(trimmed))
            .map(|(_, to)| to.as_str())
            .unwrap_or(trimmed)
    }

    pub fn race_groups(&self) -> &[RaceGroup] {
        &self.race_groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_table_parses_and_rewrites_known_hints() {
        let table = AliasTable::bundled().expect("bundled aliases parse");

        assert_eq!(table.rewrite_event_name("great britain"), "British");
        assert_eq!(table.rewrite_event_name("Emilia Romagna"), "Imola");
        assert_eq!(table.rewrite_event_name(" Japan "), "Japan");
        assert!(table.race_groups().iter().any(|group| group.key == "usa"));
    }

    #[test]
    fn groups_are_lowercased_on_load() {
        let table = AliasTable::from_yaml_str(
            "race_groups:\n  - key: British\n    aliases: [' Silverstone ', '']\n",
        )
        .expect("parses");

        let group = &table.race_groups()[0];
        assert_eq!(group.key, "british");
        assert_eq!(group.aliases, vec![String::from("silverstone")]);
        assert!(group.matches_hint("great british weekend"));
        assert!(group.matches_text("silverstone"));
        assert!(!group.matches_text(""));
    }

    #[test]
    fn short_aliases_only_match_whole_words() {
        let table = AliasTable::bundled().expect("bundled aliases parse");
        let belgium = table
            .race_groups()
            .iter()
            .find(|group| group.key == "belgium")
            .expect("belgium group");

        assert!(belgium.matches_text("spa-francorchamps"));
        assert!(!belgium.matches_text("spain"));
        assert!(!belgium.matches_hint("spanish grand prix"));
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let error = AliasTable::from_yaml_str("race_groups: {not: [a list").expect_err("fails");
        assert!(matches!(error, CoreError::Config(_)));
    }
}

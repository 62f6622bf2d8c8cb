//! JSON settings document for rule import/export.
//!
//! # Responsibility
//! - Serialize every category's ordered rule list into one document.
//! - Load such a document back into a `RuleStore`.
//!
//! # Invariants
//! - Rule order inside each category array is evaluation order.
//! - Applying a document replaces every category; absent ones become empty.

use crate::model::category::Category;
use crate::model::rule::Rule;
use crate::store::rule_store::RuleStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Document version written by this build.
pub const SETTINGS_VERSION: u32 = 1;

#[derive(Debug)]
pub enum SettingsError {
    Json(serde_json::Error),
    UnsupportedVersion { found: u32, supported: u32 },
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid settings document: {err}"),
            Self::UnsupportedVersion { found, supported } => write!(
                f,
                "settings version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::UnsupportedVersion { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Serializable snapshot of every category's rule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub rules: BTreeMap<Category, Vec<Rule>>,
}

fn current_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            rules: BTreeMap::new(),
        }
    }
}

impl SettingsDocument {
    /// Parses a document, rejecting versions newer than this build.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let document: Self = serde_json::from_str(json)?;
        document.check_version()?;
        Ok(document)
    }

    /// Rejects documents written by a newer build.
    pub fn check_version(&self) -> Result<(), SettingsError> {
        if self.version > SETTINGS_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: self.version,
                supported: SETTINGS_VERSION,
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Captures the store's current lists; empty categories are omitted.
    pub fn capture(store: &RuleStore) -> Self {
        let rules = Category::ALL
            .into_iter()
            .filter(|category| !store.is_empty(*category))
            .map(|category| (category, store.rules(category)))
            .collect();
        Self {
            version: SETTINGS_VERSION,
            rules,
        }
    }

    /// Replaces every category of `store`; returns the rule count loaded.
    pub fn apply_to(&self, store: &mut RuleStore) -> usize {
        Category::ALL
            .into_iter()
            .map(|category| {
                let rules = self.rules.get(&category).cloned().unwrap_or_default();
                store.load_category(category, rules)
            })
            .sum()
    }
}

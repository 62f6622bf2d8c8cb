//! Icon rule model.
//!
//! # Responsibility
//! - Define the persisted shape of one rule and its outcome (icon/color).
//!
//! # Invariants
//! - `id` never changes after creation; edits replace content in place.
//! - Condition order is editor order only and never affects the verdict.

use crate::model::category::Category;
use crate::model::condition::{AttributeSource, Condition, Operator};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable rule identifier, unique within a category.
pub type RuleId = String;

/// How a rule folds its condition verdicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// Every condition must hold.
    #[default]
    All,
    /// At least one condition must hold.
    Any,
}

impl Combinator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "all" => Some(Self::All),
            "any" => Some(Self::Any),
            _ => None,
        }
    }
}

/// Named, ordered condition set assigning an icon/color to matching items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub combinator: Combinator,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Rule {
    /// Creates an enabled, condition-less rule with a generated id.
    pub fn new(category: Category, name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), category, name)
    }

    /// Creates a rule with a caller-provided id (import paths, tests).
    pub fn with_id(id: impl Into<String>, category: Category, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            icon: None,
            color: None,
            combinator: Combinator::All,
            conditions: Vec::new(),
            enabled: true,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Validates editor-level invariants before a rule reaches the store.
    ///
    /// Evaluation tolerates every violation listed here; validation only
    /// keeps the editor from persisting rules that could never match.
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.id.trim().is_empty() {
            return Err(RuleValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(RuleValidationError::EmptyName);
        }
        for (index, condition) in self.conditions.iter().enumerate() {
            if !condition.source.applies_to(self.category) {
                return Err(RuleValidationError::SourceNotInCategory {
                    index,
                    source: condition.source.clone(),
                    category: self.category,
                });
            }
            if condition.legal_class().is_none() {
                return Err(RuleValidationError::IllegalOperator {
                    index,
                    source: condition.source.clone(),
                    operator: condition.operator.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Validation errors for rules submitted by editors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleValidationError {
    EmptyId,
    EmptyName,
    SourceNotInCategory {
        index: usize,
        source: AttributeSource,
        category: Category,
    },
    IllegalOperator {
        index: usize,
        source: AttributeSource,
        operator: Operator,
    },
}

impl Display for RuleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "rule id cannot be empty"),
            Self::EmptyName => write!(f, "rule name cannot be empty"),
            Self::SourceNotInCategory {
                index,
                source,
                category,
            } => write!(
                f,
                "condition {index}: source `{source}` does not apply to category `{category}`"
            ),
            Self::IllegalOperator {
                index,
                source,
                operator,
            } => write!(
                f,
                "condition {index}: operator `{operator}` is not valid for source `{source}`"
            ),
        }
    }
}

impl Error for RuleValidationError {}

#[cfg(test)]
mod tests {
    use super::{Combinator, Rule, RuleValidationError};
    use crate::model::category::Category;
    use crate::model::condition::{AttributeSource, Condition, Operator};

    #[test]
    fn new_rule_defaults() {
        let rule = Rule::new(Category::File, "Drafts");
        assert!(!rule.id.is_empty());
        assert!(rule.enabled);
        assert_eq!(rule.combinator, Combinator::All);
        assert!(rule.conditions.is_empty());
        assert_ne!(rule.id, Rule::new(Category::File, "Drafts").id);
    }

    #[test]
    fn rule_wire_format_uses_camel_case_names() {
        let rule = Rule::with_id("r1", Category::Tag, "Deep tags")
            .icon("lucide-layers")
            .combinator(Combinator::Any)
            .condition(Condition::new(
                AttributeSource::Depth,
                Operator::GreaterOrEqual,
                "3",
            ));

        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["category"], "tag");
        assert_eq!(json["combinator"], "any");
        assert_eq!(json["conditions"][0]["source"], "depth");
        assert_eq!(json["conditions"][0]["operator"], "greaterOrEqual");
        assert_eq!(json["enabled"], true);
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let rule: Rule = serde_json::from_str(
            r#"{"id":"r9","name":"Bare","category":"folder"}"#,
        )
        .unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.combinator, Combinator::All);
        assert_eq!(rule.icon, None);
    }

    #[test]
    fn validate_rejects_foreign_sources_and_illegal_operators() {
        let foreign = Rule::with_id("r1", Category::Tag, "Tagged").condition(Condition::new(
            AttributeSource::Extension,
            Operator::Is,
            "md",
        ));
        assert!(matches!(
            foreign.validate(),
            Err(RuleValidationError::SourceNotInCategory { index: 0, .. })
        ));

        let illegal = Rule::with_id("r2", Category::File, "Starred").condition(Condition::new(
            AttributeSource::Starred,
            Operator::Contains,
            "true",
        ));
        assert!(matches!(
            illegal.validate(),
            Err(RuleValidationError::IllegalOperator { index: 0, .. })
        ));

        let blank = Rule::with_id("  ", Category::File, "x");
        assert_eq!(blank.validate(), Err(RuleValidationError::EmptyId));
    }
}

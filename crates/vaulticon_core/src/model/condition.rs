//! Rule conditions: attribute sources, operators and comparison classes.
//!
//! # Invariants
//! - Sources and operators serialize as stable camelCase names.
//! - Unrecognized names deserialize into `Unknown(raw)` so one corrupted
//!   condition never fails loading a whole rule list.
//! - An operator is only legal when it belongs to its source's class.

use crate::model::category::Category;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Value family an attribute is compared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonClass {
    Text,
    TextSet,
    Number,
    Date,
    Boolean,
}

/// Named attribute a condition reads from an item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttributeSource {
    Name,
    Path,
    Extension,
    Parent,
    Tags,
    Created,
    Modified,
    Size,
    Starred,
    Depth,
    UsageCount,
    PropertyType,
    /// Persisted name this build does not recognize.
    Unknown(String),
}

impl AttributeSource {
    /// Every recognized source.
    pub const KNOWN: [AttributeSource; 12] = [
        AttributeSource::Name,
        AttributeSource::Path,
        AttributeSource::Extension,
        AttributeSource::Parent,
        AttributeSource::Tags,
        AttributeSource::Created,
        AttributeSource::Modified,
        AttributeSource::Size,
        AttributeSource::Starred,
        AttributeSource::Depth,
        AttributeSource::UsageCount,
        AttributeSource::PropertyType,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Name => "name",
            Self::Path => "path",
            Self::Extension => "extension",
            Self::Parent => "parent",
            Self::Tags => "tags",
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Size => "size",
            Self::Starred => "starred",
            Self::Depth => "depth",
            Self::UsageCount => "usageCount",
            Self::PropertyType => "propertyType",
            Self::Unknown(raw) => raw.as_str(),
        }
    }

    /// Comparison class, or `None` for unknown sources.
    pub fn class(&self) -> Option<ComparisonClass> {
        match self {
            Self::Name | Self::Path | Self::Extension | Self::Parent | Self::PropertyType => {
                Some(ComparisonClass::Text)
            }
            Self::Tags => Some(ComparisonClass::TextSet),
            Self::Created | Self::Modified => Some(ComparisonClass::Date),
            Self::Size | Self::Depth | Self::UsageCount => Some(ComparisonClass::Number),
            Self::Starred => Some(ComparisonClass::Boolean),
            Self::Unknown(_) => None,
        }
    }

    /// Whether items of `category` carry this attribute at all.
    pub fn applies_to(&self, category: Category) -> bool {
        use Category::{File, Folder, Property, Tag};
        let categories: &[Category] = match self {
            Self::Name => &[File, Folder, Tag, Property],
            Self::Path | Self::Parent | Self::Starred => &[File, Folder],
            Self::Extension | Self::Tags | Self::Created | Self::Modified | Self::Size => &[File],
            Self::Depth => &[Folder, Tag],
            Self::UsageCount => &[Tag, Property],
            Self::PropertyType => &[Property],
            Self::Unknown(_) => &[],
        };
        categories.contains(&category)
    }

    /// Recognized sources offered for one category, in editor order.
    pub fn for_category(category: Category) -> Vec<AttributeSource> {
        Self::KNOWN
            .iter()
            .filter(|source| source.applies_to(category))
            .cloned()
            .collect()
    }
}

impl From<String> for AttributeSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "name" => Self::Name,
            "path" => Self::Path,
            "extension" => Self::Extension,
            "parent" => Self::Parent,
            "tags" => Self::Tags,
            "created" => Self::Created,
            "modified" => Self::Modified,
            "size" => Self::Size,
            "starred" => Self::Starred,
            "depth" => Self::Depth,
            "usageCount" => Self::UsageCount,
            "propertyType" => Self::PropertyType,
            _ => Self::Unknown(value),
        }
    }
}

impl From<AttributeSource> for String {
    fn from(value: AttributeSource) -> Self {
        match value {
            AttributeSource::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for AttributeSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied between an attribute and a condition value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Is,
    IsNot,
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
    MatchesRegex,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    /// Persisted name this build does not recognize.
    Unknown(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Is => "is",
            Self::IsNot => "isNot",
            Self::Contains => "contains",
            Self::DoesNotContain => "doesNotContain",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::MatchesRegex => "matchesRegex",
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
            Self::GreaterOrEqual => "greaterOrEqual",
            Self::LessOrEqual => "lessOrEqual",
            Self::Unknown(raw) => raw.as_str(),
        }
    }

    /// Whether this operator belongs to `class`.
    pub fn is_legal_for(&self, class: ComparisonClass) -> bool {
        match class {
            ComparisonClass::Text => matches!(
                self,
                Self::Is
                    | Self::IsNot
                    | Self::Contains
                    | Self::DoesNotContain
                    | Self::StartsWith
                    | Self::EndsWith
                    | Self::MatchesRegex
            ),
            ComparisonClass::TextSet => matches!(self, Self::Contains | Self::DoesNotContain),
            ComparisonClass::Number | ComparisonClass::Date => matches!(
                self,
                Self::Is
                    | Self::IsNot
                    | Self::GreaterThan
                    | Self::LessThan
                    | Self::GreaterOrEqual
                    | Self::LessOrEqual
            ),
            ComparisonClass::Boolean => matches!(self, Self::Is),
        }
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "is" => Self::Is,
            "isNot" => Self::IsNot,
            "contains" => Self::Contains,
            "doesNotContain" => Self::DoesNotContain,
            "startsWith" => Self::StartsWith,
            "endsWith" => Self::EndsWith,
            "matchesRegex" => Self::MatchesRegex,
            "greaterThan" => Self::GreaterThan,
            "lessThan" => Self::LessThan,
            "greaterOrEqual" => Self::GreaterOrEqual,
            "lessOrEqual" => Self::LessOrEqual,
            _ => Self::Unknown(value),
        }
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        match value {
            Operator::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(source, operator, value)` predicate of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub source: AttributeSource,
    pub operator: Operator,
    /// Raw editor input; parsed per the source's comparison class.
    pub value: String,
}

impl Condition {
    pub fn new(source: AttributeSource, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            source,
            operator,
            value: value.into(),
        }
    }

    /// Returns the comparison class when the source/operator pair is legal.
    pub fn legal_class(&self) -> Option<ComparisonClass> {
        let class = self.source.class()?;
        self.operator.is_legal_for(class).then_some(class)
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeSource, ComparisonClass, Condition, Operator};
    use crate::model::category::Category;

    #[test]
    fn unknown_names_survive_round_trip() {
        let source = AttributeSource::from("headings".to_string());
        assert_eq!(source, AttributeSource::Unknown("headings".to_string()));
        assert_eq!(String::from(source), "headings");
        assert_eq!(Operator::from("isEmpty".to_string()).as_str(), "isEmpty");
    }

    #[test]
    fn legal_class_rejects_cross_class_operators() {
        let tags_starts = Condition::new(AttributeSource::Tags, Operator::StartsWith, "p");
        assert_eq!(tags_starts.legal_class(), None);

        let starred_not = Condition::new(AttributeSource::Starred, Operator::IsNot, "true");
        assert_eq!(starred_not.legal_class(), None);

        let size_gt = Condition::new(AttributeSource::Size, Operator::GreaterThan, "10");
        assert_eq!(size_gt.legal_class(), Some(ComparisonClass::Number));
    }

    #[test]
    fn sources_for_category_are_category_scoped() {
        let tag_sources = AttributeSource::for_category(Category::Tag);
        assert_eq!(
            tag_sources,
            vec![
                AttributeSource::Name,
                AttributeSource::Depth,
                AttributeSource::UsageCount
            ]
        );
        assert!(!AttributeSource::Tags.applies_to(Category::Folder));
    }
}

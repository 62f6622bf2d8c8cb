//! Single-condition evaluation.
//!
//! # Responsibility
//! - Validate a condition's source/operator pairing once.
//! - Pre-parse condition values (regex, numbers, dates, booleans) into a
//!   `CompiledCondition` that can be evaluated for many items.
//!
//! # Invariants
//! - Illegal pairings, unknown names, bad regexes and unparsable values
//!   compile to a condition that never matches.
//! - `Absent` attributes never satisfy any operator, negated ones included.

use crate::attribute::{normalize_tag, AttributeSet, AttributeValue};
use crate::logging::sanitize_message;
use crate::model::condition::{AttributeSource, ComparisonClass, Condition, Operator};
use chrono::{DateTime, NaiveDate};
use log::warn;
use regex::{Regex, RegexBuilder};

const REGEX_SIZE_LIMIT_BYTES: usize = 1 << 20;
const MAX_LOGGED_ERROR_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextOp {
    Is,
    IsNot,
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderOp {
    Is,
    IsNot,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
}

impl OrderOp {
    fn from_operator(operator: &Operator) -> Option<Self> {
        match operator {
            Operator::Is => Some(Self::Is),
            Operator::IsNot => Some(Self::IsNot),
            Operator::GreaterThan => Some(Self::GreaterThan),
            Operator::LessThan => Some(Self::LessThan),
            Operator::GreaterOrEqual => Some(Self::GreaterOrEqual),
            Operator::LessOrEqual => Some(Self::LessOrEqual),
            _ => None,
        }
    }

    fn test<T: PartialOrd>(self, actual: T, target: T) -> bool {
        match self {
            Self::Is => actual == target,
            Self::IsNot => actual != target,
            Self::GreaterThan => actual > target,
            Self::LessThan => actual < target,
            Self::GreaterOrEqual => actual >= target,
            Self::LessOrEqual => actual <= target,
        }
    }
}

#[derive(Debug, Clone)]
enum Check {
    /// `needle` is pre-lowercased for the case-insensitive operators.
    Text { op: TextOp, needle: String },
    Regex(Regex),
    Membership { negate: bool, member: String },
    Number { op: OrderOp, target: f64 },
    Date { op: OrderOp, target: i64 },
    Boolean(bool),
    Never,
}

/// A condition with its value parsed for repeated evaluation.
#[derive(Debug, Clone)]
pub struct CompiledCondition {
    source: AttributeSource,
    check: Check,
}

impl CompiledCondition {
    /// Validates and pre-parses `condition`. Never fails; broken conditions
    /// compile to a never-matching check and are logged.
    pub fn compile(condition: &Condition) -> Self {
        let check = match condition.legal_class() {
            Some(class) => compile_check(class, condition),
            None => {
                warn!(
                    "event=condition_compile module=engine status=skip reason=illegal_pair source={} operator={}",
                    condition.source, condition.operator
                );
                Check::Never
            }
        };

        Self {
            source: condition.source.clone(),
            check,
        }
    }

    /// Whether this condition can ever match.
    pub fn is_valid(&self) -> bool {
        !matches!(self.check, Check::Never)
    }

    pub fn evaluate(&self, attributes: &AttributeSet) -> bool {
        let value = attributes.get(&self.source);
        match (&self.check, value) {
            (Check::Never, _) | (_, AttributeValue::Absent) => false,
            (Check::Text { op, needle }, AttributeValue::Text(actual)) => {
                test_text(*op, actual, needle)
            }
            (Check::Regex(regex), AttributeValue::Text(actual)) => regex.is_match(actual),
            (Check::Membership { negate, member }, AttributeValue::TextSet(members)) => {
                let found = members
                    .iter()
                    .any(|candidate| normalize_tag(candidate).to_lowercase() == *member);
                found != *negate
            }
            (Check::Number { op, target }, AttributeValue::Number(actual)) => {
                op.test(*actual, *target)
            }
            (Check::Date { op, target }, AttributeValue::Date(actual)) => op.test(*actual, *target),
            (Check::Boolean(expected), AttributeValue::Boolean(actual)) => actual == expected,
            _ => false,
        }
    }
}

/// Evaluates one condition against a resolved attribute set.
///
/// Compiles the condition on every call; hot paths should hold a
/// `CompiledCondition` (the rule store does).
pub fn evaluate(condition: &Condition, attributes: &AttributeSet) -> bool {
    CompiledCondition::compile(condition).evaluate(attributes)
}

fn compile_check(class: ComparisonClass, condition: &Condition) -> Check {
    let value = condition.value.as_str();
    match class {
        ComparisonClass::Text => compile_text(&condition.operator, value),
        ComparisonClass::TextSet => {
            let negate = matches!(condition.operator, Operator::DoesNotContain);
            Check::Membership {
                negate,
                member: normalize_tag(value).to_lowercase(),
            }
        }
        ComparisonClass::Number => match (
            OrderOp::from_operator(&condition.operator),
            parse_number(value),
        ) {
            (Some(op), Some(target)) => Check::Number { op, target },
            _ => unparsable(condition),
        },
        ComparisonClass::Date => match (
            OrderOp::from_operator(&condition.operator),
            parse_epoch_ms(value),
        ) {
            (Some(op), Some(target)) => Check::Date { op, target },
            _ => unparsable(condition),
        },
        ComparisonClass::Boolean => match parse_bool(value) {
            Some(expected) => Check::Boolean(expected),
            None => unparsable(condition),
        },
    }
}

fn compile_text(operator: &Operator, value: &str) -> Check {
    let (op, needle) = match operator {
        Operator::Is => (TextOp::Is, value.to_string()),
        Operator::IsNot => (TextOp::IsNot, value.to_string()),
        Operator::Contains => (TextOp::Contains, value.to_lowercase()),
        Operator::DoesNotContain => (TextOp::DoesNotContain, value.to_lowercase()),
        Operator::StartsWith => (TextOp::StartsWith, value.to_lowercase()),
        Operator::EndsWith => (TextOp::EndsWith, value.to_lowercase()),
        Operator::MatchesRegex => return compile_regex(value),
        _ => return Check::Never,
    };
    Check::Text { op, needle }
}

fn compile_regex(pattern: &str) -> Check {
    match RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT_BYTES)
        .build()
    {
        Ok(regex) => Check::Regex(regex),
        Err(err) => {
            warn!(
                "event=condition_compile module=engine status=skip reason=invalid_regex pattern_len={} error={}",
                pattern.len(),
                sanitize_message(&err.to_string(), MAX_LOGGED_ERROR_CHARS)
            );
            Check::Never
        }
    }
}

fn unparsable(condition: &Condition) -> Check {
    warn!(
        "event=condition_compile module=engine status=skip reason=unparsable_value source={} operator={} value_len={}",
        condition.source,
        condition.operator,
        condition.value.len()
    );
    Check::Never
}

fn test_text(op: TextOp, actual: &str, needle: &str) -> bool {
    match op {
        TextOp::Is => actual == needle,
        TextOp::IsNot => actual != needle,
        TextOp::Contains => actual.to_lowercase().contains(needle),
        TextOp::DoesNotContain => !actual.to_lowercase().contains(needle),
        TextOp::StartsWith => actual.to_lowercase().starts_with(needle),
        TextOp::EndsWith => actual.to_lowercase().ends_with(needle),
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|number| number.is_finite())
}

/// Parses epoch milliseconds, an RFC 3339 timestamp, or `YYYY-MM-DD`
/// (midnight UTC).
pub fn parse_epoch_ms(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(ms) = trimmed.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.timestamp_millis());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc().timestamp_millis())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{evaluate, parse_epoch_ms, CompiledCondition};
    use crate::attribute::{AttributeSet, AttributeValue};
    use crate::model::category::Category;
    use crate::model::condition::{AttributeSource, Condition, Operator};

    fn file_attrs(name: &str) -> AttributeSet {
        let mut attrs = AttributeSet::new(Category::File);
        attrs.insert(AttributeSource::Name, AttributeValue::Text(name.to_string()));
        attrs
    }

    fn name(operator: Operator, value: &str) -> Condition {
        Condition::new(AttributeSource::Name, operator, value)
    }

    #[test]
    fn exact_text_operators_are_case_sensitive() {
        let attrs = file_attrs("README.md");
        assert!(evaluate(&name(Operator::Is, "README.md"), &attrs));
        assert!(!evaluate(&name(Operator::Is, "readme.md"), &attrs));
        assert!(evaluate(&name(Operator::IsNot, "readme.md"), &attrs));
    }

    #[test]
    fn substring_operators_ignore_case() {
        let attrs = file_attrs("Weekly Review.md");
        assert!(evaluate(&name(Operator::Contains, "REVIEW"), &attrs));
        assert!(evaluate(&name(Operator::StartsWith, "weekly"), &attrs));
        assert!(evaluate(&name(Operator::EndsWith, ".MD"), &attrs));
        assert!(!evaluate(&name(Operator::DoesNotContain, "review"), &attrs));
    }

    #[test]
    fn regex_matches_and_invalid_pattern_never_matches() {
        let draft = name(Operator::MatchesRegex, "^draft-");
        assert!(evaluate(&draft, &file_attrs("draft-intro.md")));
        assert!(!evaluate(&draft, &file_attrs("final-intro.md")));

        let broken = CompiledCondition::compile(&name(Operator::MatchesRegex, "(unclosed"));
        assert!(!broken.is_valid());
        assert!(!broken.evaluate(&file_attrs("(unclosed")));
    }

    #[test]
    fn tag_membership_normalizes_leading_hash() {
        let mut attrs = AttributeSet::new(Category::File);
        attrs.insert(
            AttributeSource::Tags,
            AttributeValue::TextSet(vec!["project".to_string(), "urgent".to_string()]),
        );
        let contains = Condition::new(AttributeSource::Tags, Operator::Contains, "#project");
        let excludes = Condition::new(AttributeSource::Tags, Operator::DoesNotContain, "project");
        assert!(evaluate(&contains, &attrs));
        assert!(!evaluate(&excludes, &attrs));

        let mut archive = AttributeSet::new(Category::File);
        archive.insert(
            AttributeSource::Tags,
            AttributeValue::TextSet(vec!["archive".to_string()]),
        );
        assert!(!evaluate(&contains, &archive));
        assert!(evaluate(&excludes, &archive));
    }

    #[test]
    fn absent_attribute_fails_negated_operators_too() {
        let attrs = AttributeSet::new(Category::File);
        assert!(!evaluate(&name(Operator::IsNot, "x"), &attrs));
        let no_tags = Condition::new(AttributeSource::Tags, Operator::DoesNotContain, "x");
        assert!(!evaluate(&no_tags, &attrs));
    }

    #[test]
    fn numeric_and_date_comparisons_parse_values() {
        let mut attrs = AttributeSet::new(Category::File);
        attrs.insert(AttributeSource::Size, AttributeValue::Number(2048.0));
        attrs.insert(
            AttributeSource::Modified,
            AttributeValue::Date(parse_epoch_ms("2024-03-01").unwrap()),
        );

        let big = Condition::new(AttributeSource::Size, Operator::GreaterThan, "1024");
        let small = Condition::new(AttributeSource::Size, Operator::LessOrEqual, "1k");
        let recent = Condition::new(AttributeSource::Modified, Operator::GreaterOrEqual, "2024-01-01");
        let exact = Condition::new(
            AttributeSource::Modified,
            Operator::Is,
            "2024-03-01T00:00:00Z",
        );
        assert!(evaluate(&big, &attrs));
        assert!(!evaluate(&small, &attrs));
        assert!(evaluate(&recent, &attrs));
        assert!(evaluate(&exact, &attrs));
    }

    #[test]
    fn boolean_is_parses_true_false_only() {
        let mut attrs = AttributeSet::new(Category::File);
        attrs.insert(AttributeSource::Starred, AttributeValue::Boolean(true));
        let starred = Condition::new(AttributeSource::Starred, Operator::Is, " TRUE ");
        let garbage = Condition::new(AttributeSource::Starred, Operator::Is, "yes");
        assert!(evaluate(&starred, &attrs));
        assert!(!evaluate(&garbage, &attrs));
    }

    #[test]
    fn illegal_pairs_and_unknown_names_never_match() {
        let attrs = file_attrs("note.md");
        let illegal = name(Operator::GreaterThan, "a");
        let unknown_op = name(Operator::Unknown("isEmpty".to_string()), "");
        let unknown_source = Condition::new(
            AttributeSource::Unknown("headings".to_string()),
            Operator::Contains,
            "x",
        );
        assert!(!evaluate(&illegal, &attrs));
        assert!(!evaluate(&unknown_op, &attrs));
        assert!(!evaluate(&unknown_source, &attrs));
    }

    #[test]
    fn parse_epoch_ms_accepts_supported_formats() {
        assert_eq!(parse_epoch_ms("1700000000000"), Some(1_700_000_000_000));
        assert_eq!(parse_epoch_ms("1970-01-02"), Some(86_400_000));
        assert_eq!(parse_epoch_ms("1970-01-01T00:00:01+00:00"), Some(1_000));
        assert_eq!(parse_epoch_ms("yesterday"), None);
    }
}

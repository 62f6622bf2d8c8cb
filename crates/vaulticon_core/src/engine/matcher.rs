//! Rule-level matching.
//!
//! # Invariants
//! - A rule with zero conditions never matches.
//! - A disabled rule never matches.
//! - `All` short-circuits on the first false, `Any` on the first true.

use crate::attribute::AttributeSet;
use crate::engine::predicate::CompiledCondition;
use crate::model::rule::{Combinator, Rule};

/// A rule paired with its compiled conditions.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Rule,
    conditions: Vec<CompiledCondition>,
}

impl CompiledRule {
    pub fn compile(rule: Rule) -> Self {
        let conditions = rule
            .conditions
            .iter()
            .map(CompiledCondition::compile)
            .collect();
        Self { rule, conditions }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn into_rule(self) -> Rule {
        self.rule
    }

    /// Full verdict: enabled, non-empty, and conditions satisfied.
    pub fn matches(&self, attributes: &AttributeSet) -> bool {
        self.rule.enabled && self.matches_conditions(attributes)
    }

    /// Verdict of the conditions alone, ignoring the enabled flag.
    ///
    /// Used by rule previews while a rule is being edited.
    pub fn matches_conditions(&self, attributes: &AttributeSet) -> bool {
        if self.conditions.is_empty() {
            return false;
        }
        match self.rule.combinator {
            Combinator::All => self
                .conditions
                .iter()
                .all(|condition| condition.evaluate(attributes)),
            Combinator::Any => self
                .conditions
                .iter()
                .any(|condition| condition.evaluate(attributes)),
        }
    }
}

/// Evaluates `rule` against one attribute set.
pub fn matches(rule: &Rule, attributes: &AttributeSet) -> bool {
    CompiledRule::compile(rule.clone()).matches(attributes)
}

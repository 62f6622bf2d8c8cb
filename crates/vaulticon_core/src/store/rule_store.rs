//! Ordered per-category rule lists with copy-on-write snapshots.
//!
//! # Responsibility
//! - Provide upsert/delete/reorder/enable operations reporting whether
//!   anything changed, so callers can skip redundant refresh work.
//! - Hand out immutable snapshots for first-match scans.
//!
//! # Invariants
//! - New ids append unless an insert position is given; existing ids are
//!   replaced in place and never move on save.
//! - Deletion leaves ids and relative order of other rules untouched.
//! - A snapshot never observes a partially applied mutation.

use crate::engine::matcher::CompiledRule;
use crate::model::category::Category;
use crate::model::rule::Rule;
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Immutable, ordered view of one category's compiled rules.
pub type RuleSnapshot = Arc<[CompiledRule]>;

/// Rule lists for every category.
#[derive(Debug, Default, Clone)]
pub struct RuleStore {
    lists: BTreeMap<Category, RuleSnapshot>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot for `category`; empty when no rules exist.
    pub fn snapshot(&self, category: Category) -> RuleSnapshot {
        self.lists
            .get(&category)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Ordered copy of the rules in `category`.
    pub fn rules(&self, category: Category) -> Vec<Rule> {
        self.snapshot(category)
            .iter()
            .map(|compiled| compiled.rule().clone())
            .collect()
    }

    pub fn get_rule(&self, category: Category, rule_id: &str) -> Option<Rule> {
        self.lists.get(&category).and_then(|list| {
            list.iter()
                .find(|compiled| compiled.rule().id == rule_id)
                .map(|compiled| compiled.rule().clone())
        })
    }

    /// Index of `rule_id` in evaluation order.
    pub fn position(&self, category: Category, rule_id: &str) -> Option<usize> {
        self.lists
            .get(&category)
            .and_then(|list| list.iter().position(|compiled| compiled.rule().id == rule_id))
    }

    pub fn len(&self, category: Category) -> usize {
        self.lists.get(&category).map_or(0, |list| list.len())
    }

    pub fn is_empty(&self, category: Category) -> bool {
        self.len(category) == 0
    }

    /// Replaces a category's list from persisted state, preserving order.
    ///
    /// Duplicate ids keep their first occurrence. Returns the number of
    /// rules loaded.
    pub fn load_category(&mut self, category: Category, rules: Vec<Rule>) -> usize {
        let mut seen = HashSet::new();
        let mut list = Vec::with_capacity(rules.len());
        for mut rule in rules {
            if !seen.insert(rule.id.clone()) {
                warn!(
                    "event=rules_load module=store status=skip reason=duplicate_id category={} rule_id={}",
                    category, rule.id
                );
                continue;
            }
            rule.category = category;
            list.push(CompiledRule::compile(rule));
        }

        let loaded = list.len();
        self.lists.insert(category, Arc::from(list));
        debug!(
            "event=rules_load module=store status=ok category={} count={}",
            category, loaded
        );
        loaded
    }

    /// Upserts `rule` by id, appending new rules at the end.
    pub fn save_rule(&mut self, category: Category, rule: Rule) -> bool {
        self.upsert(category, rule, None)
    }

    /// Upserts `rule`, inserting a new rule at `index` (clamped).
    ///
    /// Existing rules keep their position; use `reorder` to move them.
    pub fn save_rule_at(&mut self, category: Category, rule: Rule, index: usize) -> bool {
        self.upsert(category, rule, Some(index))
    }

    pub fn delete_rule(&mut self, category: Category, rule_id: &str) -> bool {
        let Some(index) = self.position(category, rule_id) else {
            return false;
        };
        let mut list = self.snapshot(category).to_vec();
        list.remove(index);
        self.lists.insert(category, Arc::from(list));
        debug!(
            "event=rule_delete module=store status=ok category={} rule_id={} index={}",
            category, rule_id, index
        );
        true
    }

    /// Moves the rule at `from` so it ends up at `to` (list splice).
    ///
    /// Out-of-range indices are a no-op.
    pub fn reorder(&mut self, category: Category, from: usize, to: usize) -> bool {
        let len = self.len(category);
        if from >= len || to >= len {
            warn!(
                "event=rule_reorder module=store status=skip reason=out_of_range category={} from={} to={} len={}",
                category, from, to, len
            );
            return false;
        }
        if from == to {
            return false;
        }

        let mut list = self.snapshot(category).to_vec();
        let moved = list.remove(from);
        list.insert(to, moved);
        self.lists.insert(category, Arc::from(list));
        debug!(
            "event=rule_reorder module=store status=ok category={} from={} to={}",
            category, from, to
        );
        true
    }

    pub fn set_enabled(&mut self, category: Category, rule_id: &str, enabled: bool) -> bool {
        match self.get_rule(category, rule_id) {
            Some(mut rule) if rule.enabled != enabled => {
                rule.enabled = enabled;
                self.upsert(category, rule, None)
            }
            _ => false,
        }
    }

    /// Puts back a snapshot taken before a failed write-through.
    pub(crate) fn restore_snapshot(&mut self, category: Category, snapshot: RuleSnapshot) {
        self.lists.insert(category, snapshot);
    }

    fn upsert(&mut self, category: Category, mut rule: Rule, insert_at: Option<usize>) -> bool {
        rule.category = category;
        let mut list = self.snapshot(category).to_vec();

        match list
            .iter()
            .position(|compiled| compiled.rule().id == rule.id)
        {
            Some(index) => {
                if list[index].rule() == &rule {
                    return false;
                }
                debug!(
                    "event=rule_save module=store status=ok mode=update category={} rule_id={} index={}",
                    category, rule.id, index
                );
                list[index] = CompiledRule::compile(rule);
            }
            None => {
                let index = insert_at.map_or(list.len(), |index| index.min(list.len()));
                debug!(
                    "event=rule_save module=store status=ok mode=insert category={} rule_id={} index={}",
                    category, rule.id, index
                );
                list.insert(index, CompiledRule::compile(rule));
            }
        }

        self.lists.insert(category, Arc::from(list));
        true
    }
}

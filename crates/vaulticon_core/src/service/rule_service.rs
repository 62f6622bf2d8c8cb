//! Rule editing use-case service.
//!
//! # Responsibility
//! - Validate editor input before it reaches the rule store.
//! - Apply store mutations and persist the affected category when, and
//!   only when, the store reports a change.
//!
//! # Invariants
//! - A failed write leaves the in-memory list as it was before the call.
//! - Imports are written in one repository transaction; the store is only
//!   swapped after that write succeeds.
//! - Startup loading never fails as a whole: a category that cannot be read
//!   is logged and left empty.
//! - The `bool` results are the only change notification; nothing is pushed.

use crate::model::category::Category;
use crate::model::rule::{Rule, RuleValidationError};
use crate::repo::rule_repo::{RepoError, RuleRepository};
use crate::settings::SettingsDocument;
use crate::store::rule_store::RuleStore;
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for rule editing use-cases.
#[derive(Debug)]
pub enum RuleServiceError {
    /// Rule rejected before reaching the store.
    InvalidRule(RuleValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for RuleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRule(err) => write!(f, "invalid rule: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RuleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRule(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RuleValidationError> for RuleServiceError {
    fn from(value: RuleValidationError) -> Self {
        Self::InvalidRule(value)
    }
}

impl From<RepoError> for RuleServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Rule editing facade over a store and a repository.
pub struct RuleService<R: RuleRepository> {
    repo: R,
    store: RuleStore,
}

impl<R: RuleRepository> RuleService<R> {
    /// Creates a service with an empty store; call `load_all` at startup.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            store: RuleStore::new(),
        }
    }

    /// Loads every category's persisted list into the store.
    ///
    /// Returns the total number of rules loaded.
    pub fn load_all(&mut self) -> usize {
        let mut total = 0;
        let mut failed = 0;
        for category in Category::ALL {
            let rules = match self.repo.load_rules(category) {
                Ok(rules) => rules,
                Err(err) => {
                    warn!(
                        "event=rules_load module=service status=degraded category={} error={}",
                        category, err
                    );
                    failed += 1;
                    Vec::new()
                }
            };
            total += self.store.load_category(category, rules);
        }
        let status = if failed == 0 { "ok" } else { "degraded" };
        info!(
            "event=rules_load_all module=service status={status} count={total} failed_categories={failed}"
        );
        total
    }

    /// Replaces every category with the lists of an imported document and
    /// persists them. Rules are stored as-is; broken conditions degrade at
    /// evaluation time instead of rejecting the import.
    pub fn import_settings(&mut self, document: &SettingsDocument) -> Result<usize, RuleServiceError> {
        let mut staged = RuleStore::new();
        let total = document.apply_to(&mut staged);
        let lists: BTreeMap<Category, Vec<Rule>> = Category::ALL
            .into_iter()
            .map(|category| (category, staged.rules(category)))
            .collect();
        if let Err(err) = self.repo.replace_all(&lists) {
            error!("event=settings_import module=service status=error error={err}");
            return Err(err.into());
        }
        self.store = staged;
        info!("event=settings_import module=service status=ok count={total}");
        Ok(total)
    }

    pub fn export_settings(&self) -> SettingsDocument {
        SettingsDocument::capture(&self.store)
    }

    /// Read-only access for resolvers and previews.
    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    pub fn rules(&self, category: Category) -> Vec<Rule> {
        self.store.rules(category)
    }

    /// Validates and upserts `rule`; new rules append.
    pub fn save_rule(&mut self, category: Category, rule: Rule) -> Result<bool, RuleServiceError> {
        let rule = validated(category, rule)?;
        self.write_through(category, |store| store.save_rule(category, rule))
    }

    /// Validates and upserts `rule`; a new rule is inserted at `index`.
    pub fn save_rule_at(
        &mut self,
        category: Category,
        rule: Rule,
        index: usize,
    ) -> Result<bool, RuleServiceError> {
        let rule = validated(category, rule)?;
        self.write_through(category, |store| store.save_rule_at(category, rule, index))
    }

    pub fn delete_rule(&mut self, category: Category, rule_id: &str) -> Result<bool, RuleServiceError> {
        self.write_through(category, |store| store.delete_rule(category, rule_id))
    }

    pub fn reorder(
        &mut self,
        category: Category,
        from: usize,
        to: usize,
    ) -> Result<bool, RuleServiceError> {
        self.write_through(category, |store| store.reorder(category, from, to))
    }

    pub fn set_enabled(
        &mut self,
        category: Category,
        rule_id: &str,
        enabled: bool,
    ) -> Result<bool, RuleServiceError> {
        self.write_through(category, |store| store.set_enabled(category, rule_id, enabled))
    }

    fn write_through(
        &mut self,
        category: Category,
        mutate: impl FnOnce(&mut RuleStore) -> bool,
    ) -> Result<bool, RuleServiceError> {
        let previous = self.store.snapshot(category);
        if !mutate(&mut self.store) {
            return Ok(false);
        }

        if let Err(err) = self.repo.replace_rules(category, &self.store.rules(category)) {
            error!(
                "event=rules_persist module=service status=error category={} error={}",
                category, err
            );
            self.store.restore_snapshot(category, previous);
            return Err(err.into());
        }
        Ok(true)
    }
}

fn validated(category: Category, mut rule: Rule) -> Result<Rule, RuleValidationError> {
    rule.category = category;
    rule.validate()?;
    Ok(rule)
}

//! Rule repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Load one category's ordered rule list, conditions included.
//! - Replace one category's full list, or several at once, inside a single
//!   transaction.
//!
//! # Invariants
//! - `position` columns are dense and define order; nothing else sorts.
//! - Unknown source/operator names load as `Unknown` variants so a single
//!   corrupted condition degrades to never-matching instead of failing.
//! - A row with a malformed combinator or enabled flag loads disabled; a row
//!   that cannot be decoded at all is skipped. Neither fails the load.

use crate::db::DbError;
use crate::model::category::Category;
use crate::model::condition::{AttributeSource, Condition, Operator};
use crate::model::rule::{Combinator, Rule, RuleId};
use log::{info, warn};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for rule persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    DuplicateRuleId { category: Category, rule_id: RuleId },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateRuleId { category, rule_id } => {
                write!(f, "duplicate rule id `{rule_id}` in category `{category}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::DuplicateRuleId { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Settings-persistence boundary for ordered rule lists.
pub trait RuleRepository {
    /// Loads the ordered rule list of `category`.
    fn load_rules(&self, category: Category) -> RepoResult<Vec<Rule>>;
    /// Replaces the full ordered rule list of `category`.
    fn replace_rules(&mut self, category: Category, rules: &[Rule]) -> RepoResult<()>;
    /// Replaces every listed category atomically: all lists are written or
    /// none is.
    fn replace_all(&mut self, lists: &BTreeMap<Category, Vec<Rule>>) -> RepoResult<()>;
}

/// SQLite-backed rule repository.
pub struct SqliteRuleRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteRuleRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl RuleRepository for SqliteRuleRepository<'_> {
    fn load_rules(&self, category: Category) -> RepoResult<Vec<Rule>> {
        let mut conditions = load_conditions(self.conn, category)?;

        let mut stmt = self.conn.prepare(
            "SELECT id, name, icon, color, combinator, enabled
             FROM rules
             WHERE category = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([category.as_str()])?;
        let mut rules = Vec::new();
        while let Some(row) = rows.next()? {
            let mut rule = match parse_rule_row(row, category) {
                Ok(rule) => rule,
                Err(err) => {
                    warn!(
                        "event=rule_row_skipped module=repo status=degraded category={} error={}",
                        category, err
                    );
                    continue;
                }
            };
            rule.conditions = conditions.remove(&rule.id).unwrap_or_default();
            rules.push(rule);
        }

        Ok(rules)
    }

    fn replace_rules(&mut self, category: Category, rules: &[Rule]) -> RepoResult<()> {
        ensure_unique_ids(category, rules)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        write_category(&tx, category, rules)?;
        tx.commit()?;
        info!(
            "event=rules_persist module=repo status=ok category={} count={}",
            category,
            rules.len()
        );
        Ok(())
    }

    fn replace_all(&mut self, lists: &BTreeMap<Category, Vec<Rule>>) -> RepoResult<()> {
        for (category, rules) in lists {
            ensure_unique_ids(*category, rules)?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for (category, rules) in lists {
            write_category(&tx, *category, rules)?;
        }
        tx.commit()?;
        info!(
            "event=rules_persist_all module=repo status=ok categories={} count={}",
            lists.len(),
            lists.values().map(Vec::len).sum::<usize>()
        );
        Ok(())
    }
}

fn ensure_unique_ids(category: Category, rules: &[Rule]) -> RepoResult<()> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.id.as_str()) {
            return Err(RepoError::DuplicateRuleId {
                category,
                rule_id: rule.id.clone(),
            });
        }
    }
    Ok(())
}

/// Deletes and rewrites one category inside the caller's transaction.
fn write_category(conn: &Connection, category: Category, rules: &[Rule]) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM rule_conditions WHERE category = ?1;",
        [category.as_str()],
    )?;
    conn.execute("DELETE FROM rules WHERE category = ?1;", [category.as_str()])?;

    for (position, rule) in rules.iter().enumerate() {
        conn.execute(
            "INSERT INTO rules (category, id, position, name, icon, color, combinator, enabled)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                category.as_str(),
                rule.id.as_str(),
                position as i64,
                rule.name.as_str(),
                rule.icon.as_deref(),
                rule.color.as_deref(),
                rule.combinator.as_str(),
                bool_to_int(rule.enabled),
            ],
        )?;

        for (condition_position, condition) in rule.conditions.iter().enumerate() {
            conn.execute(
                "INSERT INTO rule_conditions (category, rule_id, position, source, operator, value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    category.as_str(),
                    rule.id.as_str(),
                    condition_position as i64,
                    condition.source.as_str(),
                    condition.operator.as_str(),
                    condition.value.as_str(),
                ],
            )?;
        }
    }
    Ok(())
}

fn load_conditions(
    conn: &Connection,
    category: Category,
) -> RepoResult<BTreeMap<RuleId, Vec<Condition>>> {
    let mut stmt = conn.prepare(
        "SELECT rule_id, source, operator, value
         FROM rule_conditions
         WHERE category = ?1
         ORDER BY rule_id ASC, position ASC;",
    )?;
    let mut rows = stmt.query([category.as_str()])?;
    let mut conditions: BTreeMap<RuleId, Vec<Condition>> = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let rule_id: String = row.get("rule_id")?;
        let source: String = row.get("source")?;
        let operator: String = row.get("operator")?;
        conditions.entry(rule_id).or_default().push(Condition {
            source: AttributeSource::from(source),
            operator: Operator::from(operator),
            value: row.get("value")?,
        });
    }
    Ok(conditions)
}

/// Decodes one `rules` row. A bad combinator or enabled flag is logged and
/// the rule loads disabled so it can never match.
fn parse_rule_row(row: &Row<'_>, category: Category) -> RepoResult<Rule> {
    let id: String = row.get("id")?;
    let mut enabled = true;

    let combinator_text: String = row.get("combinator")?;
    let combinator = match Combinator::parse(&combinator_text) {
        Some(combinator) => combinator,
        None => {
            warn!(
                "event=rule_row_degraded module=repo status=disabled category={} rule_id={} reason=invalid_combinator value={}",
                category, id, combinator_text
            );
            enabled = false;
            Combinator::default()
        }
    };

    match row.get::<_, i64>("enabled")? {
        0 => enabled = false,
        1 => {}
        other => {
            warn!(
                "event=rule_row_degraded module=repo status=disabled category={} rule_id={} reason=invalid_enabled value={}",
                category, id, other
            );
            enabled = false;
        }
    }

    Ok(Rule {
        id,
        name: row.get("name")?,
        category,
        icon: row.get("icon")?,
        color: row.get("color")?,
        combinator,
        conditions: Vec::new(),
        enabled,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

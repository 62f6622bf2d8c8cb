//! Icon rule engine for vault items.
//! This crate decides which icon and color apply to files, folders, tags
//! and properties, from per-item overrides and ordered rule lists.

pub mod attribute;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod settings;
pub mod store;

pub use attribute::{
    resolve_attributes, AttributeResolver, AttributeSet, AttributeValue, DefaultAttributeResolver,
};
pub use engine::matcher::{matches, CompiledRule};
pub use engine::predicate::{evaluate, CompiledCondition};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::Category;
pub use model::condition::{AttributeSource, ComparisonClass, Condition, Operator};
pub use model::item::{
    FileDetails, FolderDetails, Item, ItemDetails, ItemId, PropertyDetails, TagDetails,
};
pub use model::rule::{Combinator, Rule, RuleId, RuleValidationError};
pub use repo::rule_repo::{RepoError, RepoResult, RuleRepository, SqliteRuleRepository};
pub use service::rule_service::{RuleService, RuleServiceError};
pub use service::ruling_service::{
    Appearance, AppearanceSource, ItemIndex, ItemProvider, ItemRuling, RulePreview, RulingKind,
    RulingResolver, SelectionRuling,
};
pub use settings::{SettingsDocument, SettingsError, SETTINGS_VERSION};
pub use store::rule_store::{RuleSnapshot, RuleStore};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

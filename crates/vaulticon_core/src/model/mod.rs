//! Domain model for icon rules and the vault items they apply to.
//!
//! # Responsibility
//! - Define categories, items, rules and conditions shared by every layer.
//! - Keep item classification in tagged variants instead of payload probing.
//!
//! # Invariants
//! - An item's category is derived from its `ItemDetails` variant.
//! - Rule ids are stable and unique within one category.
//! - Unknown persisted source/operator names survive as `Unknown` variants.

pub mod category;
pub mod condition;
pub mod item;
pub mod rule;

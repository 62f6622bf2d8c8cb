//! Persistence contracts for rule lists.
//!
//! # Responsibility
//! - Define the settings-persistence boundary the rule service writes to.
//! - Keep SQL details inside the core persistence layer.
//!
//! # Invariants
//! - Persisted order is exactly the in-memory evaluation order.
//! - A category's list is replaced atomically, never patched row by row.

pub mod rule_repo;

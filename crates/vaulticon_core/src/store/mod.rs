//! In-memory rule storage.
//!
//! # Responsibility
//! - Own the ordered per-category rule lists used for resolution.
//! - Keep compiled per-rule state in sync with rule content.
//!
//! # Invariants
//! - Stored order is evaluation order and is never implicitly sorted.
//! - Every mutation swaps in a new immutable snapshot.

pub mod rule_store;

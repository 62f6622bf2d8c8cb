//! Rule evaluation engine.
//!
//! # Responsibility
//! - Evaluate single conditions against resolved attributes (`predicate`).
//! - Fold condition verdicts into rule verdicts (`matcher`).
//!
//! # Invariants
//! - Evaluation never errors or panics; every failure path is `false`.
//! - Evaluation holds no state between calls.

pub mod matcher;
pub mod predicate;

//! Core use-case services.
//!
//! # Responsibility
//! - `rule_service`: editor-facing rule mutations with write-through
//!   persistence.
//! - `ruling_service`: resolve which rule, icon and color apply to items.

pub mod rule_service;
pub mod ruling_service;

// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Block content schemas, the validation engine, and auto-fix.
//!
//! Schemas define per-slot constraints (length bounds, required-ness,
//! forbidden substrings, keyword presence) and are resolved by deep-merging
//! three layers: compiled defaults, stored profile overrides, and optional
//! per-template overrides.

pub mod autofix;
pub mod model;
pub mod resolve;
pub mod validate;

pub use autofix::{auto_fix, AutoFixOutcome};
pub use model::{BlockSchema, OverLimitAction, SlotRule};
pub use resolve::{merge_layer, resolve_schema};
pub use validate::{validate_block, validate_page, Severity, ValidationIssue, ValidationResult};

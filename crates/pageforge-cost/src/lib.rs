// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost tracking, budget enforcement, and alerting.
//!
//! Pricing tables convert token usage into USD, the ledger persists every
//! generation attempt, and the tracker enforces the monthly budget with
//! deduplicated operator alerts.

pub mod ledger;
pub mod pricing;
pub mod tracker;

pub use ledger::{GenerationEntry, GenerationLedger, LogStatus};
pub use pricing::{calculate_cost, get_pricing, ModelPricing};
pub use tracker::CostTracker;

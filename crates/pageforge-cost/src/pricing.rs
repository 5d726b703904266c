// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model pricing tables and cost calculation.
//!
//! Pricing verified from <https://openai.com/api/pricing/> on 2026-02-15.
//!
//! gpt-4:         input=$0.03/KTok, output=$0.06/KTok
//! gpt-4-turbo:   input=$0.01/KTok, output=$0.03/KTok
//! gpt-4o:        input=$0.005/KTok, output=$0.015/KTok
//! gpt-3.5-turbo: input=$0.0005/KTok, output=$0.0015/KTok

use pageforge_core::TokenUsage;

/// Per-model pricing in USD per thousand tokens.
#[derive(Debug, Clone)]
pub struct ModelPricing {
    /// Cost per thousand prompt tokens.
    pub prompt_per_ktok: f64,
    /// Cost per thousand completion tokens.
    pub completion_per_ktok: f64,
}

/// Look up pricing for a given model identifier.
///
/// Matches on substrings, most specific first. Falls back to gpt-4o pricing
/// for unknown models so cost tracking never silently drops records.
pub fn get_pricing(model: &str) -> ModelPricing {
    let lower = model.to_lowercase();

    if lower.contains("gpt-3.5") {
        ModelPricing {
            prompt_per_ktok: 0.0005,
            completion_per_ktok: 0.0015,
        }
    } else if lower.contains("gpt-4-turbo") {
        ModelPricing {
            prompt_per_ktok: 0.01,
            completion_per_ktok: 0.03,
        }
    } else if lower.contains("gpt-4o") {
        ModelPricing {
            prompt_per_ktok: 0.005,
            completion_per_ktok: 0.015,
        }
    } else if lower.contains("gpt-4") {
        ModelPricing {
            prompt_per_ktok: 0.03,
            completion_per_ktok: 0.06,
        }
    } else {
        // Default to gpt-4o pricing (including unknown models).
        ModelPricing {
            prompt_per_ktok: 0.005,
            completion_per_ktok: 0.015,
        }
    }
}

/// Calculate cost in USD for a given token usage and pricing, rounded to six
/// decimal places.
pub fn calculate_cost(usage: &TokenUsage, pricing: &ModelPricing) -> f64 {
    let prompt = (usage.prompt_tokens as f64 / 1000.0) * pricing.prompt_per_ktok;
    let completion = (usage.completion_tokens as f64 / 1000.0) * pricing.completion_per_ktok;
    round6(prompt + completion)
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./pageforge.toml` > `~/.config/pageforge/pageforge.toml`
//! > `/etc/pageforge/pageforge.toml` with environment variable overrides via
//! the `PAGEFORGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PageforgeConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/pageforge/pageforge.toml` (system-wide)
/// 3. `~/.config/pageforge/pageforge.toml` (user XDG config)
/// 4. `./pageforge.toml` (local directory)
/// 5. `PAGEFORGE_*` environment variables
pub fn load_config() -> Result<PageforgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PageforgeConfig::default()))
        .merge(Toml::file("/etc/pageforge/pageforge.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("pageforge/pageforge.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("pageforge.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<PageforgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PageforgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PageforgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PageforgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `PAGEFORGE_COST_MONTHLY_BUDGET_USD`
/// must map to `cost.monthly_budget_usd`, not `cost.monthly.budget.usd`.
fn env_provider() -> Env {
    Env::prefixed("PAGEFORGE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: PAGEFORGE_OPENAI_API_KEY -> "openai_api_key"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("generation_", "generation.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("cost_", "cost.", 1)
            .replacen("images_", "images.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("profile_", "profile.", 1);
        mapped.into()
    })
}

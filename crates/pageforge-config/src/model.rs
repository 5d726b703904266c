// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Pageforge pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Pageforge configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PageforgeConfig {
    /// Generation pacing and orchestration settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// OpenAI API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Cost tracking and budget settings.
    #[serde(default)]
    pub cost: CostConfig,

    /// Image matching and generation settings.
    #[serde(default)]
    pub images: ImageConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Business profile injected into prompt context.
    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Generation pacing and orchestration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Minimum seconds between generation calls across all jobs. Also the
    /// stagger interval used when scheduling queued jobs.
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_secs: u64,

    /// Seconds a job is pushed back when the queue is paused.
    #[serde(default = "default_pause_recheck_secs")]
    pub pause_recheck_secs: u64,

    /// Seconds to wait before the single retry of a rate-limited block.
    #[serde(default = "default_rate_limit_retry_secs")]
    pub rate_limit_retry_secs: u64,

    /// Maximum concurrently active bulk generations per initiating user.
    #[serde(default = "default_max_bulk_per_user")]
    pub max_bulk_per_user: usize,

    /// Record kind a target page must have.
    #[serde(default = "default_page_kind")]
    pub page_kind: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            rate_limit_secs: default_rate_limit_secs(),
            pause_recheck_secs: default_pause_recheck_secs(),
            rate_limit_retry_secs: default_rate_limit_retry_secs(),
            max_bulk_per_user: default_max_bulk_per_user(),
            page_kind: default_page_kind(),
            log_level: default_log_level(),
        }
    }
}

fn default_rate_limit_secs() -> u64 {
    30
}

fn default_pause_recheck_secs() -> u64 {
    300
}

fn default_rate_limit_retry_secs() -> u64 {
    60
}

fn default_max_bulk_per_user() -> usize {
    3
}

fn default_page_kind() -> String {
    "catalog_page".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// OpenAI API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default model for text generation.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_timeout_secs() -> u64 {
    60
}

/// Cost tracking and budget configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CostConfig {
    /// Monthly spending cap in USD. Zero means unlimited.
    #[serde(default)]
    pub monthly_budget_usd: f64,

    /// Percentage of the monthly budget at which a single alert is sent.
    #[serde(default = "default_alert_threshold_pct")]
    pub alert_threshold_pct: u8,

    /// Number of recent log entries used for the rolling success rate.
    #[serde(default = "default_success_rate_window")]
    pub success_rate_window: u32,

    /// Success percentage below which a low-success alert is sent.
    #[serde(default = "default_min_success_rate_pct")]
    pub min_success_rate_pct: u8,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            monthly_budget_usd: 0.0,
            alert_threshold_pct: default_alert_threshold_pct(),
            success_rate_window: default_success_rate_window(),
            min_success_rate_pct: default_min_success_rate_pct(),
        }
    }
}

fn default_alert_threshold_pct() -> u8 {
    80
}

fn default_success_rate_window() -> u32 {
    20
}

fn default_min_success_rate_pct() -> u8 {
    80
}

/// Image matching and generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    /// Fallback attachment when no tier of the matching cascade hits.
    #[serde(default)]
    pub default_image_id: Option<String>,

    /// Generate alt text via the provider. When false, the deterministic
    /// tag-based generator is used directly.
    #[serde(default = "default_ai_alt_text")]
    pub ai_alt_text: bool,

    /// Enable the AI image-generation path for related-item cards.
    #[serde(default = "default_ai_generation")]
    pub ai_generation: bool,

    /// Fixed per-generation cost estimate in USD, charged to the budget for
    /// each generated image.
    #[serde(default = "default_generation_cost_usd")]
    pub generation_cost_usd: f64,

    /// Dimension string passed to the image provider.
    #[serde(default = "default_image_size")]
    pub image_size: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            default_image_id: None,
            ai_alt_text: default_ai_alt_text(),
            ai_generation: default_ai_generation(),
            generation_cost_usd: default_generation_cost_usd(),
            image_size: default_image_size(),
        }
    }
}

fn default_ai_alt_text() -> bool {
    true
}

fn default_ai_generation() -> bool {
    true
}

fn default_generation_cost_usd() -> f64 {
    0.04
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("pageforge").join("pageforge.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("pageforge.db"))
        .to_string_lossy()
        .into_owned()
}

/// Business profile fields substituted into prompt templates.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Business or site name.
    #[serde(default = "default_business_name")]
    pub business_name: String,

    /// Industry or vertical, e.g. "jewelry retail".
    #[serde(default)]
    pub industry: String,

    /// Writing tone, e.g. "warm and professional".
    #[serde(default = "default_tone")]
    pub tone: String,

    /// Target audience description.
    #[serde(default)]
    pub audience: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            business_name: default_business_name(),
            industry: String::new(),
            tone: default_tone(),
            audience: String::new(),
        }
    }
}

fn default_business_name() -> String {
    "Pageforge".to_string()
}

fn default_tone() -> String {
    "clear and professional".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = PageforgeConfig::default();
        assert_eq!(config.generation.rate_limit_secs, 30);
        assert_eq!(config.generation.pause_recheck_secs, 300);
        assert_eq!(config.generation.rate_limit_retry_secs, 60);
        assert_eq!(config.generation.max_bulk_per_user, 3);
        assert_eq!(config.cost.monthly_budget_usd, 0.0);
        assert_eq!(config.cost.alert_threshold_pct, 80);
        assert_eq!(config.cost.min_success_rate_pct, 80);
        assert!(config.images.ai_alt_text);
    }

    #[test]
    fn config_serializes_and_deserializes() {
        let config = PageforgeConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: PageforgeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.generation.rate_limit_secs,
            config.generation.rate_limit_secs
        );
        assert_eq!(parsed.openai.default_model, config.openai.default_model);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<PageforgeConfig, _> =
            toml::from_str("[generation]\nrate_limit_seconds = 30\n");
        assert!(result.is_err(), "typo'd key should be rejected");
    }
}

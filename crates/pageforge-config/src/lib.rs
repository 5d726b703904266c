// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Pageforge generation pipeline.
//!
//! Layered TOML configuration (compiled defaults, system, XDG user, local
//! file) with `PAGEFORGE_*` environment variable overrides.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    CostConfig, GenerationConfig, ImageConfig, OpenAiConfig, PageforgeConfig, ProfileConfig,
    StorageConfig,
};

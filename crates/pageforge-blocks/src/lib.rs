// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Block types, prompt templates, and response parsing.
//!
//! A block is one named content section of a catalog page. The registry
//! maps each [`BlockKind`] to its prompt template, required response keys,
//! image slots, and schema defaults.

pub mod kind;
pub mod parser;
pub mod prompts;
pub mod registry;

pub use kind::BlockKind;
pub use parser::{parse_response, strip_code_fence};
pub use prompts::{build_context, render};
pub use registry::{default_order, definition, resolve_order, BlockDefinition, ResponseFormat};

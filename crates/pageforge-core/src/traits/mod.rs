// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the pipeline's external seams.

pub mod cms;
pub mod notify;
pub mod provider;

pub use cms::CmsAdapter;
pub use notify::{Notifier, TracingNotifier};
pub use provider::{ImageProvider, TextProvider};

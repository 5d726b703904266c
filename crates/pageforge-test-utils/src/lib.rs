// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared mocks for Pageforge tests: scripted providers and an in-memory
//! CMS adapter.

pub mod mock_cms;
pub mod mock_provider;

pub use mock_cms::MockCms;
pub use mock_provider::{MockImageProvider, MockTextProvider};

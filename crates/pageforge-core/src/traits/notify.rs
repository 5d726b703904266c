// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Out-of-band operator notifications (budget alerts, low success rate).

use async_trait::async_trait;

use crate::error::ForgeError;

/// Delivery channel for operator alerts.
///
/// The cost tracker deduplicates alerts per period before calling this, so
/// implementations do not need their own throttling.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Sends one alert to the system operator.
    async fn notify(&self, subject: &str, body: &str) -> Result<(), ForgeError>;
}

/// Default notifier that emits alerts as `tracing` warnings.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), ForgeError> {
        tracing::warn!(subject, body, "operator alert");
        Ok(())
    }
}

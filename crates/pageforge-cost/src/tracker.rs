// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Budget enforcement and health alerting on top of the generation ledger.
//!
//! The tracker caches the current month's spend for five minutes to keep
//! budget checks off the hot path, and invalidates the cache on every write.
//! Alerts are deduplicated through the settings table: the budget-threshold
//! alert fires at most once per calendar month, the low-success-rate alert at
//! most once per day.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pageforge_config::CostConfig;
use pageforge_core::{ForgeError, Notifier};
use pageforge_storage::{queries::settings, Database};
use tokio::sync::Mutex;
use tracing::warn;

use crate::ledger::{GenerationEntry, GenerationLedger, LogStatus};

/// How long a cached monthly total stays valid.
const MONTHLY_CACHE_TTL: Duration = Duration::from_secs(300);

/// Settings key holding the "%Y-%m" of the last budget-threshold alert.
const BUDGET_ALERT_KEY: &str = "budget_alert_month";
/// Settings key holding the "%Y-%m-%d" of the last low-success alert.
const SUCCESS_ALERT_KEY: &str = "low_success_alert_date";

struct CachedTotal {
    total: f64,
    month: String,
    fetched_at: Instant,
}

/// Tracks spend against the monthly budget and raises operator alerts.
pub struct CostTracker {
    db: Arc<Database>,
    ledger: GenerationLedger,
    config: CostConfig,
    notifier: Arc<dyn Notifier>,
    cached_monthly: Mutex<Option<CachedTotal>>,
}

impl CostTracker {
    pub fn new(db: Arc<Database>, config: CostConfig, notifier: Arc<dyn Notifier>) -> Self {
        let ledger = GenerationLedger::new(Arc::clone(&db));
        Self {
            db,
            ledger,
            config,
            notifier,
            cached_monthly: Mutex::new(None),
        }
    }

    /// The underlying ledger, for read-only reporting.
    pub fn ledger(&self) -> &GenerationLedger {
        &self.ledger
    }

    /// Current month's spend in USD, served from a five-minute cache.
    pub async fn monthly_spend(&self) -> Result<f64, ForgeError> {
        let month = chrono::Utc::now().format("%Y-%m").to_string();
        let mut cache = self.cached_monthly.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.month == month && cached.fetched_at.elapsed() < MONTHLY_CACHE_TTL {
                return Ok(cached.total);
            }
        }
        let total = self.ledger.monthly_total(&month).await?;
        *cache = Some(CachedTotal {
            total,
            month,
            fetched_at: Instant::now(),
        });
        Ok(total)
    }

    /// Check whether the budget allows another provider call.
    ///
    /// A budget of zero means unlimited; at or above the budget a
    /// `ForgeError::BudgetExceeded` is returned. The threshold alert fires
    /// from `record`, not here, so a single entry that jumps straight past
    /// the budget still produces the month's warning.
    pub async fn check_budget(&self) -> Result<(), ForgeError> {
        let budget = self.config.monthly_budget_usd;
        if budget <= 0.0 {
            return Ok(());
        }

        let spent = self.monthly_spend().await?;
        if spent >= budget {
            return Err(ForgeError::BudgetExceeded {
                message: format!(
                    "monthly budget of ${budget:.2} reached (spent ${spent:.2}); \
                     generation resumes next month"
                ),
            });
        }

        Ok(())
    }

    /// Record a ledger entry, invalidate the spend cache, and run the
    /// budget-threshold and success-rate health checks.
    pub async fn record(&self, entry: &GenerationEntry) -> Result<i64, ForgeError> {
        let id = self.ledger.record(entry).await?;
        self.cached_monthly.lock().await.take();
        if entry.status == LogStatus::Success {
            self.check_budget_alert().await?;
        }
        self.check_success_rate().await?;
        Ok(id)
    }

    /// Send the once-per-month threshold alert when spend crosses the
    /// configured percentage of the budget.
    async fn check_budget_alert(&self) -> Result<(), ForgeError> {
        let budget = self.config.monthly_budget_usd;
        if budget <= 0.0 {
            return Ok(());
        }
        let spent = self.monthly_spend().await?;
        let threshold = budget * f64::from(self.config.alert_threshold_pct) / 100.0;
        if spent >= threshold {
            self.maybe_send_budget_alert(spent, budget).await?;
        }
        Ok(())
    }

    async fn maybe_send_budget_alert(&self, spent: f64, budget: f64) -> Result<(), ForgeError> {
        let month = chrono::Utc::now().format("%Y-%m").to_string();
        if settings::get(&self.db, BUDGET_ALERT_KEY).await?.as_deref() == Some(month.as_str()) {
            return Ok(());
        }

        let pct = spent / budget * 100.0;
        let body = format!(
            "Content generation has used ${spent:.2} of the ${budget:.2} monthly budget ({pct:.0}%)."
        );
        if let Err(e) = self
            .notifier
            .notify("Generation budget threshold reached", &body)
            .await
        {
            // Leave the dedup flag unset so the next entry retries delivery.
            warn!(error = %e, "failed to deliver budget alert");
            return Ok(());
        }
        settings::set(&self.db, BUDGET_ALERT_KEY, &month).await?;
        Ok(())
    }

    async fn check_success_rate(&self) -> Result<(), ForgeError> {
        let window = self.config.success_rate_window;
        let rate = match self.ledger.success_rate(window).await? {
            Some(rate) => rate,
            None => return Ok(()),
        };
        if rate >= f64::from(self.config.min_success_rate_pct) {
            return Ok(());
        }

        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        if settings::get(&self.db, SUCCESS_ALERT_KEY).await?.as_deref() == Some(today.as_str()) {
            return Ok(());
        }

        let body = format!(
            "Only {rate:.0}% of the last {window} generation attempts succeeded \
             (minimum {}%). Check the generation log for recurring errors.",
            self.config.min_success_rate_pct
        );
        if let Err(e) = self
            .notifier
            .notify("Generation success rate is low", &body)
            .await
        {
            warn!(error = %e, "failed to deliver success-rate alert");
            return Ok(());
        }
        settings::set(&self.db, SUCCESS_ALERT_KEY, &today).await?;
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Work queue service.
//!
//! Wraps the persistent queue with stagger arithmetic, the global pause
//! flag, and completion estimates. Trigger arming is the orchestrator's
//! concern; this service only owns durable state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pageforge_core::{ForgeError, JobStatus, PageId};
use pageforge_storage::{
    queries::{queue, settings},
    Database, QueueItem, QueueStats,
};
use tracing::info;

/// Settings key for the global pause flag.
const PAUSED_KEY: &str = "queue_paused";

#[derive(Clone)]
pub struct WorkQueue {
    db: Arc<Database>,
    rate_limit: Duration,
}

impl WorkQueue {
    pub fn new(db: Arc<Database>, rate_limit: Duration) -> Self {
        Self { db, rate_limit }
    }

    /// The stagger interval between consecutively enqueued jobs.
    pub fn rate_limit(&self) -> Duration {
        self.rate_limit
    }

    /// Compute the scheduled time for the `index`-th job of a batch admitted
    /// at `base`. Using one base instant for the whole batch keeps the
    /// spacing between consecutive jobs exactly one rate-limit interval.
    pub fn stagger(&self, base: DateTime<Utc>, index: u32) -> DateTime<Utc> {
        base + chrono::Duration::seconds(self.rate_limit.as_secs() as i64 * i64::from(index))
    }

    /// Insert a pending entry scheduled for `at`. Returns `false` when a
    /// pending entry for the page already exists.
    pub async fn enqueue(
        &self,
        page: &PageId,
        at: DateTime<Utc>,
        block_selection: Option<&[String]>,
    ) -> Result<bool, ForgeError> {
        let inserted = queue::enqueue(&self.db, &page.0, at, block_selection).await?;
        if inserted {
            info!(page_id = %page, scheduled_at = %at, "job enqueued");
        }
        Ok(inserted)
    }

    pub async fn get_active(&self, page: &PageId) -> Result<Option<QueueItem>, ForgeError> {
        queue::get_active(&self.db, &page.0).await
    }

    pub async fn update_status(
        &self,
        page: &PageId,
        status: JobStatus,
        error: Option<&str>,
    ) -> Result<bool, ForgeError> {
        queue::update_status(&self.db, &page.0, status, error).await
    }

    pub async fn remove(&self, page: &PageId) -> Result<bool, ForgeError> {
        queue::remove(&self.db, &page.0).await
    }

    pub async fn clear(&self) -> Result<(), ForgeError> {
        queue::clear(&self.db).await
    }

    /// All pending entries ordered by scheduled time.
    pub async fn pending(&self) -> Result<Vec<QueueItem>, ForgeError> {
        queue::pending(&self.db).await
    }

    pub async fn stats(&self) -> Result<QueueStats, ForgeError> {
        queue::stats(&self.db).await
    }

    /// Pause processing. The flag is durable and survives restarts.
    pub async fn pause(&self) -> Result<(), ForgeError> {
        settings::set(&self.db, PAUSED_KEY, "1").await?;
        info!("queue paused");
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), ForgeError> {
        settings::delete(&self.db, PAUSED_KEY).await?;
        info!("queue resumed");
        Ok(())
    }

    pub async fn is_paused(&self) -> Result<bool, ForgeError> {
        Ok(settings::get(&self.db, PAUSED_KEY).await?.as_deref() == Some("1"))
    }

    /// Estimated time the queue drains: the latest scheduled job plus the
    /// average completed-job duration, falling back to one rate-limit
    /// interval before any job has completed.
    pub async fn estimated_completion(&self) -> Result<Option<DateTime<Utc>>, ForgeError> {
        let Some(last) = queue::last_scheduled_at(&self.db).await? else {
            return Ok(None);
        };
        let avg_secs = queue::average_job_duration_secs(&self.db)
            .await?
            .unwrap_or(self.rate_limit.as_secs() as f64);
        Ok(Some(
            last + chrono::Duration::milliseconds((avg_secs * 1000.0) as i64),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_queue(rate_secs: u64) -> WorkQueue {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        WorkQueue::new(db, Duration::from_secs(rate_secs))
    }

    #[tokio::test]
    async fn stagger_spacing_is_exactly_one_interval() {
        let wq = test_queue(30).await;
        let base = Utc::now();
        let mut ats = Vec::new();
        for (index, id) in ["p0", "p1", "p2"].iter().enumerate() {
            let at = wq.stagger(base, index as u32);
            assert!(wq.enqueue(&PageId(id.to_string()), at, None).await.unwrap());
            ats.push(at);
        }

        // Shared base instant: no skew between consecutive jobs.
        assert_eq!((ats[1] - ats[0]).num_milliseconds(), 30_000);
        assert_eq!((ats[2] - ats[1]).num_milliseconds(), 30_000);
        assert_eq!((ats[2] - ats[0]).num_milliseconds(), 60_000);
    }

    #[tokio::test]
    async fn duplicate_pending_enqueue_is_rejected() {
        let wq = test_queue(0).await;
        let page = PageId("p1".into());
        let first = wq.enqueue(&page, Utc::now(), None).await.unwrap();
        let second = wq.enqueue(&page, Utc::now(), None).await.unwrap();
        assert!(first);
        assert!(!second);
        assert_eq!(wq.stats().await.unwrap().pending, 1);
    }

    #[tokio::test]
    async fn pause_flag_is_durable() {
        let wq = test_queue(0).await;
        assert!(!wq.is_paused().await.unwrap());
        wq.pause().await.unwrap();
        assert!(wq.is_paused().await.unwrap());
        wq.resume().await.unwrap();
        assert!(!wq.is_paused().await.unwrap());
    }

    #[tokio::test]
    async fn estimated_completion_uses_rate_limit_before_history() {
        let wq = test_queue(30).await;
        assert!(wq.estimated_completion().await.unwrap().is_none());

        let at = Utc::now();
        assert!(wq.enqueue(&PageId("p1".into()), at, None).await.unwrap());
        let estimate = wq.estimated_completion().await.unwrap().unwrap();
        let delta = (estimate - at).num_seconds();
        assert!((delta - 30).abs() <= 1, "delta = {delta}");
    }
}

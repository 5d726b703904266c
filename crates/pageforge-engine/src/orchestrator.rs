// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation orchestrator.
//!
//! Owns the work queue, the trigger scheduler, and the per-job pipeline.
//! Jobs are staggered one rate-limit interval apart at enqueue time; a
//! shared rate gate re-arms any trigger that fires too early, so provider
//! calls stay spaced no matter how triggers interleave. A paused queue
//! pushes jobs back without touching their durable state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use pageforge_blocks::resolve_order;
use pageforge_config::PageforgeConfig;
use pageforge_core::{CmsAdapter, ForgeError, ImageProvider, JobStatus, PageId, TextProvider};
use pageforge_cost::CostTracker;
use pageforge_storage::{Database, QueueStats};
use tracing::{error, info, warn};

use crate::generator::BlockGenerator;
use crate::queue::WorkQueue;
use crate::scheduler::Scheduler;

/// Page meta key holding a stored custom block order as a JSON array.
const BLOCK_ORDER_META: &str = "pageforge_block_order";

/// One bulk request. The user's slot is released when the last page of the
/// batch reaches a terminal state or leaves the queue.
struct BatchState {
    user: Option<String>,
    remaining: AtomicUsize,
}

/// Result of a batch enqueue: which pages were queued and which already had
/// a pending job.
#[derive(Debug, Default)]
pub struct EnqueueReport {
    pub queued: Vec<PageId>,
    pub skipped: Vec<PageId>,
}

pub struct GenerationService {
    config: PageforgeConfig,
    queue: WorkQueue,
    scheduler: Scheduler,
    cms: Arc<dyn CmsAdapter>,
    generator: BlockGenerator,
    /// Shared rate gate: the instant of the last job admission.
    last_call: tokio::sync::Mutex<Option<Instant>>,
    /// Active bulk batches per user.
    bulk_active: std::sync::Mutex<HashMap<String, usize>>,
    /// Page membership of in-flight batches.
    batches: std::sync::Mutex<HashMap<String, Arc<BatchState>>>,
}

impl GenerationService {
    pub fn new(
        db: Arc<Database>,
        cms: Arc<dyn CmsAdapter>,
        text: Arc<dyn TextProvider>,
        images: Arc<dyn ImageProvider>,
        tracker: Arc<CostTracker>,
        config: PageforgeConfig,
    ) -> Arc<Self> {
        let queue = WorkQueue::new(
            Arc::clone(&db),
            Duration::from_secs(config.generation.rate_limit_secs),
        );
        let generator = BlockGenerator::new(
            db,
            Arc::clone(&cms),
            text,
            images,
            tracker,
            config.clone(),
        );
        Arc::new(Self {
            config,
            queue,
            scheduler: Scheduler::new(),
            cms,
            generator,
            last_call: tokio::sync::Mutex::new(None),
            bulk_active: std::sync::Mutex::new(HashMap::new()),
            batches: std::sync::Mutex::new(HashMap::new()),
        })
    }

    /// Queue a single page for generation.
    pub async fn enqueue_page(
        self: &Arc<Self>,
        page: &PageId,
        blocks: Option<&[String]>,
        user: Option<&str>,
    ) -> Result<bool, ForgeError> {
        let report = self
            .enqueue_batch(std::slice::from_ref(page), blocks, user)
            .await?;
        Ok(!report.queued.is_empty())
    }

    /// Queue a batch of pages, staggered one rate-limit interval apart.
    ///
    /// Pages with a pending job already in the queue are skipped. Bulk
    /// requests (more than one page) count against the per-user limit and
    /// are rejected outright when the user is at it.
    pub async fn enqueue_batch(
        self: &Arc<Self>,
        pages: &[PageId],
        blocks: Option<&[String]>,
        user: Option<&str>,
    ) -> Result<EnqueueReport, ForgeError> {
        // Reject an invalid block selection before touching the queue.
        if let Some(selection) = blocks {
            resolve_order(Some(selection), None)?;
        }

        let batch = self.admit_batch(pages.len(), user)?;

        // One base instant for the whole batch keeps the stagger spacing
        // exact across pages.
        let base = Utc::now();
        let mut report = EnqueueReport::default();
        for (index, page) in pages.iter().enumerate() {
            let at = self.queue.stagger(base, index as u32);
            let inserted = self.queue.enqueue(page, at, blocks).await?;
            if !inserted {
                info!(page_id = %page, "page already queued, skipping");
                self.settle_batch_member(&batch);
                report.skipped.push(page.clone());
                continue;
            }
            if let Some(state) = &batch {
                self.batches
                    .lock()
                    .unwrap()
                    .insert(page.0.clone(), Arc::clone(state));
            }
            let delay = (at - Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            self.arm(page, delay);
            report.queued.push(page.clone());
        }
        Ok(report)
    }

    /// Cancel and forget a page's job: disarms its trigger and deletes its
    /// queue rows.
    pub async fn remove(&self, page: &PageId) -> Result<bool, ForgeError> {
        self.scheduler.cancel(&page.0);
        let removed = self.queue.remove(page).await?;
        self.release_batch_member(&page.0);
        Ok(removed)
    }

    /// Emergency stop: disarm every trigger and empty the queue.
    pub async fn clear(&self) -> Result<(), ForgeError> {
        self.scheduler.cancel_all();
        self.queue.clear().await?;
        self.batches.lock().unwrap().clear();
        self.bulk_active.lock().unwrap().clear();
        Ok(())
    }

    pub async fn pause(&self) -> Result<(), ForgeError> {
        self.queue.pause().await
    }

    pub async fn resume(&self) -> Result<(), ForgeError> {
        self.queue.resume().await
    }

    pub async fn stats(&self) -> Result<QueueStats, ForgeError> {
        self.queue.stats().await
    }

    pub async fn estimated_completion(
        &self,
    ) -> Result<Option<chrono::DateTime<Utc>>, ForgeError> {
        self.queue.estimated_completion().await
    }

    /// Re-arm triggers for every pending job, typically after a restart.
    /// Jobs whose scheduled time has passed fire immediately.
    pub async fn rearm_pending(self: &Arc<Self>) -> Result<usize, ForgeError> {
        let items = self.queue.pending().await?;
        let count = items.len();
        for item in items {
            let delay = (item.scheduled_at - Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            self.arm(&PageId(item.page_id), delay);
        }
        if count > 0 {
            info!(count, "pending jobs re-armed");
        }
        Ok(count)
    }

    /// Whether a trigger is currently armed for the page.
    pub fn is_armed(&self, page: &PageId) -> bool {
        self.scheduler.is_armed(&page.0)
    }

    fn arm(self: &Arc<Self>, page: &PageId, delay: Duration) {
        let service = Arc::clone(self);
        let key = page.0.clone();
        let page = page.clone();
        self.scheduler.arm(&key, delay, async move {
            if let Err(e) = service.process_page(&page).await {
                error!(page_id = %page, error = %e, "job processing failed");
            }
        });
    }

    /// Run one queued job end to end. Called from a fired trigger.
    async fn process_page(self: &Arc<Self>, page: &PageId) -> Result<(), ForgeError> {
        let Some(item) = self.queue.get_active(page).await? else {
            // Removed between arming and firing.
            return Ok(());
        };
        if item.status != JobStatus::Pending {
            return Ok(());
        }

        if self.queue.is_paused().await? {
            let recheck = Duration::from_secs(self.config.generation.pause_recheck_secs);
            info!(page_id = %page, recheck_secs = recheck.as_secs(), "queue paused, pushing job back");
            self.arm(page, recheck);
            return Ok(());
        }

        // Shared rate gate. A trigger that fires before one interval has
        // elapsed since the last admitted job re-arms itself for the
        // remainder instead of running.
        {
            let mut last = self.last_call.lock().await;
            let rate = self.queue.rate_limit();
            if let Some(previous) = *last {
                let elapsed = previous.elapsed();
                if elapsed < rate {
                    let remaining = rate - elapsed;
                    self.arm(page, remaining);
                    return Ok(());
                }
            }
            *last = Some(Instant::now());
        }

        let user = self.batch_user(&page.0);
        let result = self.run_job(page, item.block_selection.as_deref(), user.as_deref()).await;
        self.release_batch_member(&page.0);
        result
    }

    async fn run_job(
        &self,
        page: &PageId,
        selection: Option<&[String]>,
        user: Option<&str>,
    ) -> Result<(), ForgeError> {
        // The page may have been deleted or repurposed since enqueue.
        let expected_kind = &self.config.generation.page_kind;
        match self.cms.page_kind(page).await? {
            None => {
                return self
                    .fail_job(page, "page no longer exists")
                    .await;
            }
            Some(kind) if kind != *expected_kind => {
                return self
                    .fail_job(page, &format!("page is a '{kind}' record, expected '{expected_kind}'"))
                    .await;
            }
            Some(_) => {}
        }

        let fields = self.cms.page_fields(page).await?;
        let stored_order = self.stored_block_order(page).await?;
        let order = match resolve_order(selection, stored_order.as_deref()) {
            Ok(order) => order,
            Err(e) => return self.fail_job(page, &e.to_string()).await,
        };

        self.queue
            .update_status(page, JobStatus::Processing, None)
            .await?;
        info!(page_id = %page, blocks = order.len(), "job started");

        let extra = std::collections::BTreeMap::new();
        let mut failures: Vec<String> = Vec::new();
        for kind in order {
            let mut attempt = self
                .generator
                .generate_block(page, kind, &fields, &extra, user)
                .await;

            // One retry after a provider rate limit; any other failure is
            // tolerated and the job moves on to the next block.
            if matches!(&attempt, Err(e) if e.is_rate_limited()) {
                let pause = Duration::from_secs(self.config.generation.rate_limit_retry_secs);
                warn!(page_id = %page, block = %kind, pause_secs = pause.as_secs(), "provider rate limited, retrying block once");
                tokio::time::sleep(pause).await;
                attempt = self
                    .generator
                    .generate_block(page, kind, &fields, &extra, user)
                    .await;
            }

            if let Err(e) = attempt {
                warn!(page_id = %page, block = %kind, error = %e, "block generation failed");
                failures.push(format!("block {kind}: {e}"));
            }
        }

        if failures.is_empty() {
            self.queue
                .update_status(page, JobStatus::Completed, None)
                .await?;
            self.finalize(page).await;
            info!(page_id = %page, "job completed");
        } else {
            let detail = failures.join("; ");
            self.queue
                .update_status(page, JobStatus::Failed, Some(&detail))
                .await?;
            warn!(page_id = %page, error = %detail, "job failed");
        }
        Ok(())
    }

    async fn fail_job(&self, page: &PageId, reason: &str) -> Result<(), ForgeError> {
        warn!(page_id = %page, reason, "job rejected");
        self.queue
            .update_status(page, JobStatus::Failed, Some(reason))
            .await?;
        Ok(())
    }

    /// Post-completion hooks. Failures here never demote a completed job.
    async fn finalize(&self, page: &PageId) {
        if let Err(e) = self.cms.sync_seo_fields(page).await {
            warn!(page_id = %page, error = %e, "SEO field sync failed");
        }
        if let Err(e) = self.cms.refresh_related_links(page).await {
            warn!(page_id = %page, error = %e, "related link refresh failed");
        }
    }

    async fn stored_block_order(&self, page: &PageId) -> Result<Option<Vec<String>>, ForgeError> {
        let Some(raw) = self.cms.get_meta(page, BLOCK_ORDER_META).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(order) => Ok(Some(order)),
            Err(e) => {
                warn!(page_id = %page, error = %e, "stored block order is not a JSON string array, ignoring");
                Ok(None)
            }
        }
    }

    /// Admit a bulk request against the per-user limit, returning the batch
    /// state tracking its in-flight pages. Single-page requests are never
    /// limited.
    fn admit_batch(
        &self,
        page_count: usize,
        user: Option<&str>,
    ) -> Result<Option<Arc<BatchState>>, ForgeError> {
        if page_count < 2 {
            return Ok(None);
        }
        if let Some(user) = user {
            let mut active = self.bulk_active.lock().unwrap();
            let count = active.entry(user.to_string()).or_insert(0);
            if *count >= self.config.generation.max_bulk_per_user {
                return Err(ForgeError::Internal(format!(
                    "user '{user}' already has {count} bulk generations running, try again later"
                )));
            }
            *count += 1;
        }
        Ok(Some(Arc::new(BatchState {
            user: user.map(str::to_string),
            remaining: AtomicUsize::new(page_count),
        })))
    }

    fn batch_user(&self, page_id: &str) -> Option<String> {
        self.batches
            .lock()
            .unwrap()
            .get(page_id)
            .and_then(|state| state.user.clone())
    }

    /// Drop a page from its batch (terminal state or removal) and release
    /// the user's bulk slot when the batch drains.
    fn release_batch_member(&self, page_id: &str) {
        let Some(state) = self.batches.lock().unwrap().remove(page_id) else {
            return;
        };
        if state.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.release_batch_slot(&state);
        }
    }

    /// Account for a batch member that never entered the queue.
    fn settle_batch_member(&self, batch: &Option<Arc<BatchState>>) {
        let Some(state) = batch else { return };
        if state.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.release_batch_slot(state);
        }
    }

    fn release_batch_slot(&self, state: &BatchState) {
        let Some(user) = &state.user else { return };
        let mut active = self.bulk_active.lock().unwrap();
        if let Some(count) = active.get_mut(user) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                active.remove(user);
            }
        }
    }
}

// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot job triggers.
//!
//! Each page can have at most one armed trigger. Arming a page that already
//! has one replaces it; cancelling aborts the timer without running the job.
//! A job that has started running is never cancelled mid-flight.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

struct Armed {
    generation: u64,
    token: CancellationToken,
}

/// Trigger registry keyed by page id. Cheap to clone.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Arc<Mutex<HashMap<String, Armed>>>,
    counter: Arc<Mutex<u64>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot trigger that runs `job` after `delay`, replacing any
    /// trigger already armed for this page.
    pub fn arm<F>(&self, page_id: &str, delay: Duration, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = {
            let mut counter = self.counter.lock().unwrap();
            *counter += 1;
            *counter
        };
        let token = CancellationToken::new();

        if let Some(previous) = self.inner.lock().unwrap().insert(
            page_id.to_string(),
            Armed {
                generation,
                token: token.clone(),
            },
        ) {
            previous.token.cancel();
        }

        debug!(page_id, delay_secs = delay.as_secs_f64(), "trigger armed");

        let inner = Arc::clone(&self.inner);
        let page = page_id.to_string();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    // Disarm only if we are still the current trigger.
                    {
                        let mut map = inner.lock().unwrap();
                        if map.get(&page).map(|a| a.generation) == Some(generation) {
                            map.remove(&page);
                        }
                    }
                    job.await;
                }
            }
        });
    }

    /// Cancel the armed trigger for a page. Returns whether one existed.
    pub fn cancel(&self, page_id: &str) -> bool {
        match self.inner.lock().unwrap().remove(page_id) {
            Some(armed) => {
                armed.token.cancel();
                debug!(page_id, "trigger cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every armed trigger.
    pub fn cancel_all(&self) {
        let mut map = self.inner.lock().unwrap();
        for (_, armed) in map.drain() {
            armed.token.cancel();
        }
    }

    /// Whether a trigger is currently armed for the page.
    pub fn is_armed(&self, page_id: &str) -> bool {
        self.inner.lock().unwrap().contains_key(page_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn armed_trigger_fires_once() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&fired);
        scheduler.arm("p1", Duration::from_millis(10), async move {
            f.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.is_armed("p1"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_armed("p1"));
    }

    #[tokio::test]
    async fn cancel_prevents_firing() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&fired);
        scheduler.arm("p1", Duration::from_millis(20), async move {
            f.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.cancel("p1"));
        assert!(!scheduler.cancel("p1"));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rearming_replaces_the_previous_trigger() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&fired);
        scheduler.arm("p1", Duration::from_millis(20), async move {
            f.fetch_add(10, Ordering::SeqCst);
        });
        let f = Arc::clone(&fired);
        scheduler.arm("p1", Duration::from_millis(20), async move {
            f.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_all_sweeps_everything() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for page in ["p1", "p2", "p3"] {
            let f = Arc::clone(&fired);
            scheduler.arm(page, Duration::from_millis(20), async move {
                f.fetch_add(1, Ordering::SeqCst);
            });
        }
        scheduler.cancel_all();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!scheduler.is_armed("p1"));
    }
}

//! Debounced render scheduling with staleness guards.
//!
//! Every edit schedules a render; only the newest one is allowed to reach
//! the preview. Two monotonic counters enforce this: `version` stamps each
//! request and invalidates older timers, `applied` records the newest
//! result that reached the apply callback so a slow render can never
//! overwrite a faster, newer one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct RenderScheduler {
    debounce: Duration,
    version: Arc<AtomicU64>,
    applied: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RenderScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            version: Arc::new(AtomicU64::new(0)),
            applied: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        }
    }

    /// The version stamped on the most recent request.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// The version of the newest result that reached its apply callback.
    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::SeqCst)
    }

    /// Schedules `render` after the debounce delay, superseding any pending
    /// request. The staleness checks run twice: after the timer fires and
    /// again after the render resolves, so a request that was overtaken
    /// mid-render is discarded instead of applied.
    pub fn schedule<F, Fut, A>(&self, render: F, apply: A)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = String> + Send + 'static,
        A: FnOnce(String) + Send + 'static,
    {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let newest = Arc::clone(&self.version);
        let applied = Arc::clone(&self.applied);
        let debounce = self.debounce;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if newest.load(Ordering::SeqCst) != version {
                return;
            }
            let html = render().await;
            if newest.load(Ordering::SeqCst) != version {
                log::debug!("discarding stale render (version {version})");
                return;
            }
            if applied.fetch_max(version, Ordering::SeqCst) >= version {
                return;
            }
            apply(html);
        });

        let mut task = self.task.lock().unwrap();
        if let Some(previous) = task.replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}

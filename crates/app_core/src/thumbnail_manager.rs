//! Thumbnail readiness tracking and retry polling
//!
//! The server generates thumbnails lazily. After a listing loads, the manager:
//! - asks the server to pre-generate every listed thumbnail (fire-and-forget)
//! - polls thumbnails the presenter reported as failed, re-requesting them
//!   with a cache-busting `retry` query until they load or attempts run out

use crate::config::ThumbnailConfig;
use app_api::{GalleryApi, Resource};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Load state of one thumbnail as reported by the presenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailStatus {
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    status: ThumbnailStatus,
    retry: Option<u32>,
}

/// Outcome of one polling tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryTick {
    /// Failed thumbnails got a new cache-busting source
    Retried(usize),
    /// Nothing left to retry
    Done,
    /// Attempt budget used up with thumbnails still failing
    GaveUp(usize),
}

/// Retry schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ThumbnailConfig::default())
    }
}

impl From<&ThumbnailConfig> for RetryPolicy {
    fn from(config: &ThumbnailConfig) -> Self {
        Self {
            interval: config.retry_interval(),
            max_attempts: config.max_retries,
        }
    }
}

/// Shared thumbnail board plus the single retry loop
#[derive(Clone)]
pub struct ThumbnailManager {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    retry_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    policy: RetryPolicy,
}

impl ThumbnailManager {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            retry_task: Arc::new(Mutex::new(None)),
            policy,
        }
    }

    /// Track exactly `paths`; entries already known keep their state
    pub fn track<'a>(&self, paths: impl IntoIterator<Item = &'a str>) {
        let mut entries = self.entries.lock();
        let mut next = HashMap::new();
        for path in paths {
            let entry = entries.remove(path).unwrap_or(Entry {
                status: ThumbnailStatus::Pending,
                retry: None,
            });
            next.insert(path.to_string(), entry);
        }
        *entries = next;
    }

    pub fn mark_loaded(&self, path: &str) {
        self.set_status(path, ThumbnailStatus::Loaded);
    }

    pub fn mark_failed(&self, path: &str) {
        self.set_status(path, ThumbnailStatus::Failed);
    }

    fn set_status(&self, path: &str, status: ThumbnailStatus) {
        match self.entries.lock().get_mut(path) {
            Some(entry) => entry.status = status,
            None => tracing::debug!("Ignoring status for untracked thumbnail {}", path),
        }
    }

    pub fn status(&self, path: &str) -> Option<ThumbnailStatus> {
        self.entries.lock().get(path).map(|e| e.status)
    }

    /// Server-relative thumbnail source, including any cache buster
    pub fn source(&self, path: &str) -> String {
        let retry = self.entries.lock().get(path).and_then(|e| e.retry);
        Resource::Thumbnail.source(path, retry)
    }

    pub fn failed_paths(&self) -> Vec<String> {
        let mut failed: Vec<String> = self
            .entries
            .lock()
            .iter()
            .filter(|(_, e)| e.status == ThumbnailStatus::Failed)
            .map(|(p, _)| p.clone())
            .collect();
        failed.sort();
        failed
    }

    /// One polling step; `attempt` counts from 1
    pub fn retry_tick(&self, attempt: u32) -> RetryTick {
        let mut entries = self.entries.lock();
        let failed: Vec<&mut Entry> = entries
            .values_mut()
            .filter(|e| e.status == ThumbnailStatus::Failed)
            .collect();

        if failed.is_empty() {
            return RetryTick::Done;
        }
        if attempt >= self.policy.max_attempts {
            return RetryTick::GaveUp(failed.len());
        }

        let count = failed.len();
        for entry in failed {
            entry.retry = Some(attempt);
        }
        RetryTick::Retried(count)
    }

    /// Start polling, aborting any loop already running
    pub fn start_retry(&self) {
        let manager = self.clone();
        let policy = self.policy;

        let mut slot = self.retry_task.lock();
        if let Some(previous) = slot.take() {
            previous.abort();
            tracing::debug!("Replaced running thumbnail retry loop");
        }

        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(policy.interval);
            // The first tick completes immediately
            ticker.tick().await;

            let mut attempt = 0;
            loop {
                ticker.tick().await;
                attempt += 1;

                match manager.retry_tick(attempt) {
                    RetryTick::Retried(n) => {
                        tracing::debug!("Retrying {} thumbnails (attempt {}/{})", n, attempt, policy.max_attempts);
                    }
                    RetryTick::Done => {
                        tracing::info!("All thumbnails loaded");
                        break;
                    }
                    RetryTick::GaveUp(n) => {
                        tracing::info!("Stopped retrying, {} thumbnails still pending", n);
                        break;
                    }
                }
            }
        }));
    }

    pub fn stop_retry(&self) {
        if let Some(handle) = self.retry_task.lock().take() {
            handle.abort();
        }
    }

    /// Wait for the running retry loop, if any, to finish on its own
    pub async fn wait_retry(&self) {
        let handle = self.retry_task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::error!("Thumbnail retry loop failed: {}", e);
                }
            }
        }
    }

    pub fn is_retrying(&self) -> bool {
        self.retry_task
            .lock()
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Ask the server to pre-generate thumbnails, then start polling.
    /// Failures are logged only.
    pub fn pregenerate(&self, api: Arc<dyn GalleryApi>, paths: Vec<String>) -> Option<JoinHandle<()>> {
        if paths.is_empty() {
            return None;
        }

        let manager = self.clone();
        Some(tokio::spawn(async move {
            tracing::info!("Starting thumbnail generation for {} images", paths.len());
            match api.generate_thumbnails(&paths).await {
                Ok(job) => {
                    tracing::info!("Thumbnail generation {}: {} images queued", job.status, job.total);
                    manager.start_retry();
                }
                Err(e) => tracing::error!("Error pre-generating thumbnails: {}", e),
            }
        }))
    }
}

impl Default for ThumbnailManager {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ThumbnailManager {
        let m = ThumbnailManager::default();
        m.track(["a.png", "b.png", "c.png"]);
        m
    }

    #[test]
    fn test_track_keeps_known_entries() {
        let m = manager();
        m.mark_loaded("a.png");
        m.track(["a.png", "d.png"]);

        assert_eq!(m.status("a.png"), Some(ThumbnailStatus::Loaded));
        assert_eq!(m.status("d.png"), Some(ThumbnailStatus::Pending));
        assert_eq!(m.status("b.png"), None);
    }

    #[test]
    fn test_retry_tick() {
        let m = manager();
        assert_eq!(m.retry_tick(1), RetryTick::Done);

        m.mark_failed("b.png");
        m.mark_failed("c.png");
        assert_eq!(m.retry_tick(1), RetryTick::Retried(2));
        assert_eq!(m.source("b.png"), "/thumbnail/b.png?retry=1");
        assert_eq!(m.source("a.png"), "/thumbnail/a.png");

        m.mark_loaded("b.png");
        assert_eq!(m.retry_tick(2), RetryTick::Retried(1));
        assert_eq!(m.source("b.png"), "/thumbnail/b.png?retry=1");
        assert_eq!(m.source("c.png"), "/thumbnail/c.png?retry=2");

        assert_eq!(m.retry_tick(15), RetryTick::GaveUp(1));
        assert_eq!(m.failed_paths(), ["c.png"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_budget() {
        let m = manager();
        m.mark_failed("a.png");
        m.start_retry();
        assert!(m.is_retrying());

        tokio::time::sleep(Duration::from_secs(46)).await;

        assert!(!m.is_retrying());
        assert_eq!(m.source("a.png"), "/thumbnail/a.png?retry=14");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_early_when_loaded() {
        let m = manager();
        m.mark_failed("a.png");
        m.start_retry();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(m.source("a.png"), "/thumbnail/a.png?retry=1");
        m.mark_loaded("a.png");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!m.is_retrying());
        assert_eq!(m.source("a.png"), "/thumbnail/a.png?retry=1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_previous_loop() {
        let m = manager();
        m.mark_failed("a.png");
        m.start_retry();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(m.source("a.png"), "/thumbnail/a.png?retry=1");

        // A surviving first loop would tick to retry=2 at 6s
        m.start_retry();
        tokio::time::sleep(Duration::from_millis(2700)).await;
        assert_eq!(m.source("a.png"), "/thumbnail/a.png?retry=1");

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(m.source("a.png"), "/thumbnail/a.png?retry=1");
        assert!(m.is_retrying());

        m.stop_retry();
        assert!(!m.is_retrying());
    }
}

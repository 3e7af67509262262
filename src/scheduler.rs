//! One-shot deletion timers.
//!
//! Jobs live only in process memory; a restart drops anything pending. That
//! limitation is accepted: the worst case is content that outlives its timer.
use crate::cleanup;
use crate::model::DeletionJob;
use crate::telegram::ChatApi;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

/// Registry of pending deletion jobs, keyed by job name plus a sequence
/// number so a re-delivered item gets an independent job instead of merging
/// with (or cancelling) an earlier one.
#[derive(Clone)]
pub struct Scheduler {
    api: Arc<dyn ChatApi>,
    jobs: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
    seq: Arc<AtomicU64>,
}

impl Scheduler {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self {
            api,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Arm a one-shot timer that fires the cleanup body after the job's
    /// delay, at most once. No-op (returns `None`) when there is nothing to
    /// delete or the delay is zero.
    pub async fn schedule(&self, job: DeletionJob) -> Option<String> {
        if job.messages.is_empty() || job.delay.is_zero() {
            return None;
        }
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let key = format!("{}_{}", job.key(), seq);
        info!(
            key = %key,
            messages = job.messages.len(),
            delay_secs = job.delay.as_secs(),
            "scheduled deletion job"
        );

        let api = self.api.clone();
        let jobs = self.jobs.clone();
        let task_key = key.clone();
        // The registry lock is held across the spawn so the task cannot win
        // the race and try to deregister before its handle is inserted.
        let mut pending = self.jobs.lock().await;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(job.delay).await;
            cleanup::run(api.as_ref(), job).await;
            jobs.lock().await.remove(&task_key);
        });
        pending.insert(key.clone(), handle);
        drop(pending);
        Some(key)
    }

    /// Abort a pending job. Nothing calls this today; it exists so an admin
    /// edit could cancel stale jobs without reworking the registry.
    pub async fn cancel(&self, key: &str) -> bool {
        match self.jobs.lock().await.remove(key) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub async fn pending(&self) -> usize {
        self.jobs.lock().await.len()
    }
}

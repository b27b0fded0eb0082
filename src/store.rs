//! Job persistence.
//!
//! [`JobStore`] is the capability the orchestrator consumes; any backend that
//! satisfies it (relational, key-value, …) is a drop-in replacement for the
//! in-memory [`MemoryJobStore`] shipped here.
//!
//! The only consistency requirement is per-key atomicity: `update` is a
//! read-modify-write that must not lose a concurrent update to the same id.
//! Progress updates arrive as a rapid series of partial writes.

use crate::error::StoreError;
use crate::job::{Job, JobId, JobStatus, JobUpdate};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a freshly created job.
    async fn create(&self, job: Job) -> Result<Job, StoreError>;

    async fn get(&self, id: &JobId) -> Result<Option<Job>, StoreError>;

    /// Merge `update` into the stored job. Returns `None` if `id` is unknown.
    async fn update(&self, id: &JobId, update: JobUpdate) -> Result<Option<Job>, StoreError>;

    /// Completed jobs only, newest `created_at` first, at most `limit` items.
    async fn list_recent_completed(&self, limit: usize) -> Result<Vec<Job>, StoreError>;

    /// Returns `true` if a job was removed.
    async fn delete(&self, id: &JobId) -> Result<bool, StoreError>;
}

/// Process-scoped in-memory store.
///
/// Construct one at startup and share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job: Job) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::QueryFailed(format!(
                "duplicate job id {}",
                job.id
            )));
        }
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn update(&self, id: &JobId, update: JobUpdate) -> Result<Option<Job>, StoreError> {
        // The write guard spans the whole read-modify-write.
        let mut jobs = self.jobs.write().await;
        Ok(jobs.get_mut(id).map(|job| {
            job.apply(update);
            job.clone()
        }))
    }

    async fn list_recent_completed(&self, limit: usize) -> Result<Vec<Job>, StoreError> {
        let jobs = self.jobs.read().await;
        let mut completed: Vec<Job> = jobs
            .values()
            .filter(|j| j.status == JobStatus::Completed)
            .cloned()
            .collect();
        completed.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        completed.truncate(limit);
        Ok(completed)
    }

    async fn delete(&self, id: &JobId) -> Result<bool, StoreError> {
        Ok(self.jobs.write().await.remove(id).is_some())
    }
}

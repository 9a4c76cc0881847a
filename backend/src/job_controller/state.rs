//! Tracks the state of background PDF generation jobs.
//!
//! Jobs run outside the request/response cycle (see `services::declarations::pdf`). The main
//! components are:
//! - `JobsState`: clonable, thread-safe holder of every job's `JobStatus`, injected into the
//!   Actix application state in `main.rs`.
//! - `JobUpdate`: message a worker sends to report a status change.
//! - `start_job_updater`: long-running task that applies `JobUpdate`s to `JobsState`.

use log::{debug, error};
use std::{collections::HashMap, sync::Arc};
use taxform_common::jobs::JobStatus;
use tokio::sync::{mpsc, RwLock};

const UPDATE_CHANNEL_CAPACITY: usize = 100;

/// Shared view of all background jobs.
///
/// Handlers read `jobs` directly (e.g. `GET /api/jobs/{job_id}`); workers never write it, they
/// push `JobUpdate`s through `tx` instead.
#[derive(Clone)]
pub struct JobsState {
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// Creates an empty state and the receiver to hand to `start_job_updater`.
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Registers a new job as `Pending`.
    pub async fn register(&self, job_id: &str) {
        self.jobs
            .write()
            .await
            .insert(job_id.to_string(), JobStatus::Pending);
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

/// Represents a status update for a specific background job.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobUpdate {
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
        }
    }
}

/// Applies every `JobUpdate` received on `rx` to the shared state until all senders are gone.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        match &update.status {
            JobStatus::Failed(message) => error!("job {} failed: {}", update.job_id, message),
            status => debug!("job {} -> {:?}", update.job_id, status),
        }
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id, update.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn updater_applies_updates_in_order() {
        let (state, _unused) = JobsState::new();
        state.register("job-1").await;
        assert_eq!(state.status("job-1").await, Some(JobStatus::Pending));

        let (tx, rx) = mpsc::channel(4);
        tx.send(JobUpdate::new("job-1", JobStatus::InProgress(50)))
            .await
            .unwrap();
        tx.send(JobUpdate::new("job-1", JobStatus::Completed("out.pdf".into())))
            .await
            .unwrap();
        drop(tx);

        // Returns once the channel is drained and closed.
        start_job_updater(state.clone(), rx).await;

        assert_eq!(
            state.status("job-1").await,
            Some(JobStatus::Completed("out.pdf".into()))
        );
    }

    #[tokio::test]
    async fn unknown_job_has_no_status() {
        let (state, _rx) = JobsState::new();
        assert_eq!(state.status("nope").await, None);
    }
}

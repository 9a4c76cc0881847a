use serde::{Deserialize, Serialize};

/// Lifecycle of a background PDF generation job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Progress in percent.
    InProgress(u32),
    /// Path of the generated document.
    Completed(String),
    Failed(String),
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}

use serde::{Deserialize, Serialize};

/// Response body of `POST /api/declarations/{form_id}/pdf`.
/// Carries the identifier to poll under `/api/jobs/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTicket {
    pub job_id: String,
}

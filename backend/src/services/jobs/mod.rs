//! Polling endpoints for background jobs, under `/api/jobs`.
//!
//! - `GET /{job_id}`: current `JobStatus` of the job.
//! - `GET /{job_id}/file`: the generated PDF once the job is `Completed`.

mod file;
mod status;

use actix_web::web::{get, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/jobs";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/{job_id}", get().to(status::process))
        .route("/{job_id}/file", get().to(file::process))
}

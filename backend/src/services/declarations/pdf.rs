//! # PDF Job Start Service
//!
//! `POST /api/declarations/{form_id}/pdf` turns a declaration into a PDF in the background.
//!
//! ## Workflow:
//!
//! 1.  **Validation**: The body is validated and the mapping table of `form_id` is fetched from
//!     the registry before any job exists, so configuration problems come back as a 4xx/5xx
//!     response instead of a failed job.
//!
//! 2.  **Job Scheduling**: `schedule_pdf_job` registers a `Pending` job, returns its `job_id`
//!     immediately and spawns a Tokio task that owns the job's lifecycle.
//!
//! 3.  **Background Processing**: The task runs `DocumentPipeline::generate_blocking` through
//!     `tokio::task::spawn_blocking`. The pipeline reports `InProgress` itself; the task reports
//!     `Completed(pdf_path)` or `Failed(message)` to the job controller at the end.

use super::generate::DocumentPipeline;
use super::prepare;
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::services::context::MappingRegistry;
use actix_web::{web, HttpResponse, Responder};
use serde_json::Value;
use std::sync::Arc;
use taxform_common::jobs::JobStatus;
use taxform_common::model::declaration::Declaration;
use taxform_common::model::mapping::MappingTable;
use taxform_common::requests::JobTicket;
use uuid::Uuid;

/// The Actix web handler for `POST /api/declarations/{form_id}/pdf`.
///
/// # Returns
/// - `200 OK` with a `JobTicket` once the job is scheduled.
/// - `400`, `404` or `500` as for the context endpoint, without creating a job.
pub(crate) async fn process(
    form_id: web::Path<String>,
    registry: web::Data<MappingRegistry>,
    pipeline: web::Data<DocumentPipeline>,
    state: web::Data<JobsState>,
    payload: web::Json<Value>,
) -> impl Responder {
    let form_id = form_id.into_inner();
    match prepare(&registry, &form_id, payload.into_inner()).await {
        Ok((declaration, table)) => {
            let job_id =
                schedule_pdf_job(state, pipeline.into_inner(), form_id, declaration, table).await;
            HttpResponse::Ok().json(JobTicket { job_id })
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// Registers the job as `Pending` and spawns its background task. Returns the new `job_id`.
async fn schedule_pdf_job(
    state: web::Data<JobsState>,
    pipeline: Arc<DocumentPipeline>,
    form_id: String,
    declaration: Declaration,
    table: Arc<MappingTable>,
) -> String {
    let job_id = Uuid::new_v4().to_string();
    state.register(&job_id).await;

    let tx = state.tx.clone();
    let job_id_clone = job_id.clone();

    tokio::spawn(async move {
        let progress_tx = tx.clone();
        let job_id_for_blocking = job_id_clone.clone();
        let handle = tokio::task::spawn_blocking(move || {
            pipeline.generate_blocking(
                &progress_tx,
                &job_id_for_blocking,
                &form_id,
                &declaration,
                &table,
            )
        });

        let status = match handle.await {
            Ok(Ok(pdf_path)) => JobStatus::Completed(pdf_path.display().to_string()),
            Ok(Err(e)) => JobStatus::Failed(e.to_string()),
            // The task panicked or was cancelled.
            Err(e) => JobStatus::Failed(format!("Task join error: {}", e)),
        };
        let _ = tx.send(JobUpdate::new(job_id_clone, status)).await;
    });

    job_id
}

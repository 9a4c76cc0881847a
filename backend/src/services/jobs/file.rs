//! Serves the PDF produced by a finished job.

use crate::job_controller::state::JobsState;
use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::error;
use taxform_common::jobs::JobStatus;

/// # Returns
/// - `200 OK` with the PDF, shown inline.
/// - `404 Not Found` for unknown jobs.
/// - `409 Conflict` while the job is pending, running, or if it failed.
/// - `500 Internal Server Error` if the reported file cannot be opened.
pub(crate) async fn process(
    req: HttpRequest,
    job_id: web::Path<String>,
    state: web::Data<JobsState>,
) -> impl Responder {
    let job_id = job_id.into_inner();
    let path = match state.status(&job_id).await {
        None => return HttpResponse::NotFound().body("Job ID not found"),
        Some(JobStatus::Completed(path)) => path,
        Some(JobStatus::Failed(message)) => {
            return HttpResponse::Conflict().body(format!("Job failed: {}", message));
        }
        Some(_) => return HttpResponse::Conflict().body("Job has not completed yet"),
    };

    match NamedFile::open(&path) {
        Ok(file) => {
            let file_name = format!("{}.pdf", job_id);
            file.set_content_disposition(ContentDisposition {
                disposition: DispositionType::Inline,
                parameters: vec![DispositionParam::Filename(file_name)],
            })
            .into_response(&req)
        }
        Err(e) => {
            error!("job {}: cannot open {}: {}", job_id, path, e);
            HttpResponse::InternalServerError().body("Generated file is not available")
        }
    }
}

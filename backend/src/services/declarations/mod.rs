//! # Declaration Service Module
//!
//! HTTP surface of the context engine, under `/api/declarations`.
//!
//! ## Sub-modules:
//! - `context`: returns the flat placeholder context for a posted declaration.
//! - `pdf`: schedules a background job that renders the declaration into a PDF.
//! - `generate`: the blocking pipeline those jobs run.

mod context;
pub mod generate;
mod pdf;

use actix_web::web::{post, scope};
use actix_web::{HttpResponse, Scope};
use log::warn;
use serde_json::Value;
use std::sync::Arc;
use taxform_common::model::declaration::{Declaration, ValidationError};
use taxform_common::model::mapping::MappingTable;

use crate::services::context::{MappingError, MappingRegistry};

/// The base path for all declaration endpoints.
const API_PATH: &str = "/api/declarations";

/// Configures and returns the Actix `Scope` for the declaration routes.
///
/// # Registered Routes:
///
/// *   **`POST /{form_id}/context`**:
///     - **Handler**: `context::process`
///     - **Description**: Validates the JSON declaration in the body, applies the mapping table
///       of `form_id` and returns the resulting placeholder → text map.
///
/// *   **`POST /{form_id}/pdf`**:
///     - **Handler**: `pdf::process`
///     - **Description**: Same validation and mapping lookup, then starts a generation job and
///       returns its `job_id`. Poll `/api/jobs/{job_id}` for the outcome.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/{form_id}/context", post().to(context::process))
        .route("/{form_id}/pdf", post().to(pdf::process))
}

/// Why a declaration request was refused before any work started.
#[derive(Debug)]
enum Rejection {
    Invalid(ValidationError),
    Configuration(MappingError),
}

impl Rejection {
    fn into_response(self) -> HttpResponse {
        match self {
            Rejection::Invalid(e) => HttpResponse::BadRequest().body(e.to_string()),
            Rejection::Configuration(e @ MappingError::ConfigurationMissing { .. }) => {
                warn!("{}", e);
                HttpResponse::NotFound().body(e.to_string())
            }
            Rejection::Configuration(e) => {
                warn!("{}", e);
                HttpResponse::InternalServerError().body(e.to_string())
            }
        }
    }
}

/// Validates the payload and fetches the mapping table of `form_id`.
///
/// The payload is checked first so that a broken body is reported as such even for unknown
/// forms.
async fn prepare(
    registry: &MappingRegistry,
    form_id: &str,
    payload: Value,
) -> Result<(Declaration, Arc<MappingTable>), Rejection> {
    let declaration = Declaration::from_value(payload).map_err(Rejection::Invalid)?;
    let table = registry
        .get(form_id)
        .await
        .map_err(Rejection::Configuration)?;
    Ok((declaration, table))
}

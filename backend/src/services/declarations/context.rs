//! `POST /api/declarations/{form_id}/context`.

use super::generate::DocumentPipeline;
use super::prepare;
use crate::services::context::MappingRegistry;
use actix_web::{web, HttpResponse, Responder};
use log::debug;
use serde_json::Value;
use taxform_common::model::record::AsNode;

/// Builds and returns the flat context of the posted declaration.
///
/// # Returns
/// - `200 OK` with the context as a JSON object.
/// - `400 Bad Request` if the body is not a valid declaration.
/// - `404 Not Found` if `form_id` has no mapping.
/// - `500 Internal Server Error` if the mapping exists but cannot be used.
pub(crate) async fn process(
    form_id: web::Path<String>,
    registry: web::Data<MappingRegistry>,
    pipeline: web::Data<DocumentPipeline>,
    payload: web::Json<Value>,
) -> impl Responder {
    let form_id = form_id.into_inner();
    match prepare(&registry, &form_id, payload.into_inner()).await {
        Ok((declaration, table)) => {
            let context = pipeline.builder().build(declaration.as_node(), &table);
            debug!("built {} entries for form '{}'", context.len(), form_id);
            HttpResponse::Ok().json(context)
        }
        Err(rejection) => rejection.into_response(),
    }
}

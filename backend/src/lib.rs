//! Tax declaration service: maps declaration records onto form placeholders and renders PDFs.

pub mod config;
pub mod job_controller;
pub mod services;

use actix_web::web;

/// Registers every API scope. Shared by the server and the integration tests.
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.service(services::declarations::configure_routes())
        .service(services::jobs::configure_routes());
}

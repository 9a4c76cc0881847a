//! Types shared between the declaration service and its clients: the typed declaration record
//! and its generic traversal view, mapping tables, flat contexts, and job status payloads.

pub mod jobs;
pub mod model;
pub mod requests;

#[doc(hidden)]
pub use serde_json;

//! # Context Engine
//!
//! Turns a declaration record into the flat placeholder → value map a template is filled with.
//! The shape of the record and the shape of the template are decoupled by a mapping table
//! loaded per form.
//!
//! ## Sub-modules:
//! - `resolver`: dotted-path lookup over keyed and named-field nodes, never failing on gaps.
//! - `loader`: reads `<form_id>_mapping.json` from the configured mapping directory.
//! - `registry`: run-scoped cache of loaded tables shared by handlers and jobs.
//! - `formatter`: locale-aware display formatting (grouped amounts, period phrases, labels).
//! - `builder`: applies a table to a record, one output entry per rule.

pub mod builder;
pub mod formatter;
pub mod loader;
pub mod registry;
pub mod resolver;

pub use builder::{build, ContextBuilder};
pub use formatter::{Locale, VIETNAMESE};
pub use loader::{MappingError, MappingLoader};
pub use registry::MappingRegistry;
pub use resolver::{resolve, Resolution};

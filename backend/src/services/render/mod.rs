//! Output side of the pipeline: a flat context goes into a form template, and the filled
//! document goes into a PDF.
//!
//! ## Sub-modules:
//! - `template`: `{{ NAME }}` substitution over `<form_id>.tpl` files, plus built-in date fields.
//! - `pdf`: genpdf layout of the filled, line-oriented document.

pub mod pdf;
pub mod template;

pub use pdf::{ConvertError, PdfConverter};
pub use template::{RenderError, TemplateRenderer};

//! Fills a form template with a flat context.
//!
//! Templates are plain text files named `<form_id>.tpl` in the template directory, using the
//! line grammar the PDF converter understands. Placeholders are written `{{ NAME }}`; the spaces
//! inside the braces are optional. Substituted values are escaped so they cannot add cells,
//! lines or styles to the document.

use chrono::{Datelike, Local, NaiveDate};
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use taxform_common::model::context::FlatContext;
use thiserror::Error;

const TEMPLATE_EXTENSION: &str = "tpl";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template for form '{form_id}' not found at {}", path.display())]
    TemplateMissing { form_id: String, path: PathBuf },

    #[error("failed to read template {}: {source}", path.display())]
    TemplateUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to write rendered document {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}";

/// Characters with a meaning in the document grammar, anywhere in a line.
const GRAMMAR_CHARS: [char; 4] = ['\\', '|', '*', '#'];

/// Makes a value inert in the document grammar. Line breaks and other control characters
/// become spaces; grammar characters, and a leading `-`, get a `\` prefix.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        if c.is_control() {
            out.push(' ');
            continue;
        }
        if GRAMMAR_CHARS.contains(&c) || (i == 0 && c == '-') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Placeholders every template may use without a mapping entry. Values from the context win.
fn builtin_placeholders(today: NaiveDate) -> HashMap<&'static str, String> {
    HashMap::from([
        ("TODAY_DAY", today.day().to_string()),
        ("TODAY_MONTH", today.month().to_string()),
        ("TODAY_YEAR", today.year().to_string()),
        (
            "SIGNING_DATE",
            format!("ngày {} tháng {} năm {}", today.day(), today.month(), today.year()),
        ),
    ])
}

/// Substitutes every `{{ NAME }}` in `template`.
///
/// Lookup order is the context, then the built-in date placeholders for `today`. Unknown names
/// render as an empty string. Every value goes through [`escape_value`].
pub fn substitute(
    template: &str,
    context: &FlatContext,
    today: NaiveDate,
) -> Result<String, RenderError> {
    let re = Regex::new(PLACEHOLDER_PATTERN)?;
    let builtins = builtin_placeholders(today);
    let rendered = re
        .replace_all(template, |caps: &regex::Captures| {
            let name = &caps[1];
            if let Some(value) = context.get(name) {
                return escape_value(value);
            }
            match builtins.get(name) {
                Some(value) => escape_value(value),
                None => {
                    debug!("template placeholder '{}' has no value", name);
                    String::new()
                }
            }
        })
        .into_owned();
    Ok(rendered)
}

/// Loads form templates from one directory and writes filled copies.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    template_dir: PathBuf,
}

impl TemplateRenderer {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
        }
    }

    pub fn template_path(&self, form_id: &str) -> PathBuf {
        self.template_dir
            .join(format!("{}.{}", form_id, TEMPLATE_EXTENSION))
    }

    pub fn load_template(&self, form_id: &str) -> Result<String, RenderError> {
        let path = self.template_path(form_id);
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RenderError::TemplateMissing {
                form_id: form_id.to_string(),
                path: path.clone(),
            },
            _ => RenderError::TemplateUnreadable {
                path: path.clone(),
                source: e,
            },
        })
    }

    /// Renders the template of `form_id` with today's local date.
    pub fn render(&self, form_id: &str, context: &FlatContext) -> Result<String, RenderError> {
        let template = self.load_template(form_id)?;
        substitute(&template, context, Local::now().date_naive())
    }

    /// Renders and writes the intermediate document to `output_path`, creating parent
    /// directories. Returns the path written.
    pub fn render_to_file(
        &self,
        form_id: &str,
        context: &FlatContext,
        output_path: &Path,
    ) -> Result<PathBuf, RenderError> {
        let rendered = self.render(form_id, context)?;
        let write_err = |source| RenderError::Write {
            path: output_path.to_path_buf(),
            source,
        };
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(output_path, rendered).map_err(write_err)?;
        Ok(output_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn context(entries: &[(&str, &str)]) -> FlatContext {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 20).unwrap()
    }

    #[test]
    fn replaces_placeholders_with_and_without_spaces() {
        let ctx = context(&[("F_NAME", "ACME"), ("F_36", "1.000")]);
        let out = substitute("[01] {{F_NAME}}\n[36] {{ F_36 }}", &ctx, day()).unwrap();
        assert_eq!(out, "[01] ACME\n[36] 1.000");
    }

    #[test]
    fn unknown_placeholder_renders_empty() {
        let out = substitute("a{{ F_NOPE }}b", &FlatContext::new(), day()).unwrap();
        assert_eq!(out, "ab");
    }

    #[test]
    fn builtin_dates_fill_signature_block() {
        let out = substitute(
            "Hà Nội, {{ SIGNING_DATE }} ({{TODAY_YEAR}})",
            &FlatContext::new(),
            day(),
        )
        .unwrap();
        assert_eq!(out, "Hà Nội, ngày 20 tháng 4 năm 2025 (2025)");
    }

    #[test]
    fn context_overrides_builtins() {
        let ctx = context(&[("TODAY_YEAR", "2020")]);
        assert_eq!(substitute("{{TODAY_YEAR}}", &ctx, day()).unwrap(), "2020");
    }

    #[test]
    fn values_are_escaped_for_the_document_grammar() {
        let ctx = context(&[
            ("F_10", "12|HĐ-ĐL"),
            ("F_06", "Lô 5\r\n# Phường 3"),
            ("F_NAME", "Công ty *Sao* Mai"),
            ("F_40", "-500"),
            ("F_PATH", r"C:\ho so"),
        ]);
        let out = substitute(
            "| {{F_10}} | {{F_40}} |\n- {{F_06}}\n{{F_NAME}} {{F_PATH}}",
            &ctx,
            day(),
        )
        .unwrap();
        assert_eq!(
            out,
            "| 12\\|HĐ-ĐL | \\-500 |\n- Lô 5  \\# Phường 3\nCông ty \\*Sao\\* Mai C:\\\\ho so"
        );
    }

    #[test]
    fn non_placeholder_braces_are_left_alone() {
        let out = substitute("{ single } {{ not valid! }}", &FlatContext::new(), day()).unwrap();
        assert_eq!(out, "{ single } {{ not valid! }}");
    }

    #[test]
    fn missing_template_is_reported_with_path() {
        let dir = TempDir::new().unwrap();
        let renderer = TemplateRenderer::new(dir.path());

        match renderer.render("01_GTGT_2021", &FlatContext::new()) {
            Err(RenderError::TemplateMissing { path, .. }) => {
                assert_eq!(path, dir.path().join("01_GTGT_2021.tpl"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn writes_rendered_document_creating_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("F1.tpl"), "# {{ F_TITLE }}\n").unwrap();
        let renderer = TemplateRenderer::new(dir.path());
        let out = dir.path().join("out").join("job.txt");

        let written = renderer
            .render_to_file("F1", &context(&[("F_TITLE", "TỜ KHAI")]), &out)
            .unwrap();

        assert_eq!(written, out);
        assert_eq!(fs::read_to_string(out).unwrap(), "# TỜ KHAI\n");
    }
}

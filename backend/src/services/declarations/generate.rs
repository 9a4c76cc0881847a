//! The synchronous document pipeline behind `POST /api/declarations/{form_id}/pdf`.
//!
//! `generate_blocking` runs inside `spawn_blocking`: it builds the flat context, fills the form
//! template into `<output_dir>/<form_id>_<job_id>.txt` and converts that file into
//! `<output_dir>/<form_id>_<job_id>.pdf`. Progress is reported to the job controller between
//! stages.

use crate::config::AppConfig;
use crate::job_controller::state::JobUpdate;
use crate::services::context::ContextBuilder;
use crate::services::render::{ConvertError, PdfConverter, RenderError, TemplateRenderer};
use log::info;
use std::path::PathBuf;
use taxform_common::jobs::JobStatus;
use taxform_common::model::declaration::Declaration;
use taxform_common::model::mapping::MappingTable;
use taxform_common::model::record::AsNode;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Everything a job needs besides the declaration and its mapping table.
#[derive(Debug, Clone)]
pub struct DocumentPipeline {
    builder: ContextBuilder,
    renderer: TemplateRenderer,
    converter: PdfConverter,
    output_dir: PathBuf,
}

impl DocumentPipeline {
    pub fn new(
        builder: ContextBuilder,
        renderer: TemplateRenderer,
        converter: PdfConverter,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            builder,
            renderer,
            converter,
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ContextBuilder::default(),
            TemplateRenderer::new(&config.template_dir),
            PdfConverter::new(&config.font_dir),
            &config.output_dir,
        )
    }

    pub fn builder(&self) -> &ContextBuilder {
        &self.builder
    }

    /// `(<form_id>_<job_id>.txt, <form_id>_<job_id>.pdf)` under the output directory.
    pub fn output_paths(&self, form_id: &str, job_id: &str) -> (PathBuf, PathBuf) {
        let stem = format!("{}_{}", form_id, job_id);
        (
            self.output_dir.join(format!("{}.txt", stem)),
            self.output_dir.join(format!("{}.pdf", stem)),
        )
    }

    /// Runs the whole pipeline for one job and returns the path of the PDF.
    ///
    /// # Arguments
    /// * `tx` - Channel to the job controller, used for `InProgress` updates only. The caller
    ///   reports the final status.
    /// * `job_id` - Identifier the output files are named after.
    /// * `form_id` - Form whose template is rendered.
    /// * `declaration` - Validated declaration.
    /// * `table` - Mapping table of `form_id`.
    pub fn generate_blocking(
        &self,
        tx: &mpsc::Sender<JobUpdate>,
        job_id: &str,
        form_id: &str,
        declaration: &Declaration,
        table: &MappingTable,
    ) -> Result<PathBuf, GenerateError> {
        let progress = |percent: u32| {
            let _ = tx.blocking_send(JobUpdate::new(job_id, JobStatus::InProgress(percent)));
        };
        progress(0);

        let context = self.builder.build_par(declaration.as_node(), table);
        progress(30);

        let (text_path, pdf_path) = self.output_paths(form_id, job_id);
        self.renderer.render_to_file(form_id, &context, &text_path)?;
        progress(60);

        self.converter
            .convert(&text_path, &pdf_path, &title_for(form_id))?;
        progress(100);

        info!("job {}: generated {}", job_id, pdf_path.display());
        Ok(pdf_path)
    }
}

/// `01_GTGT_2021` -> `Tờ khai 01/GTGT`.
fn title_for(form_id: &str) -> String {
    let mut parts = form_id.split('_');
    match (parts.next(), parts.next()) {
        (Some(number), Some(kind)) => format!("Tờ khai {}/{}", number, kind),
        _ => format!("Tờ khai {}", form_id),
    }
}

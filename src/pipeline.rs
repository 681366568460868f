//! Export pipeline
//!
//! Sequences a full export: load the course document, inline its images,
//! then hand the self-contained block tree to the chosen exporter. The
//! steps are strictly sequential; each completes before the next starts.
//! Every export re-derives the inlined tree from the loaded document;
//! nothing is shared between invocations.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::ValueEnum;
use thiserror::Error;

use crate::blocks::parse_blocks;
use crate::course::GenerationRequest;
use crate::export::{ExportError, PdfExporter, PptxExporter};
use crate::inliner::ImageInliner;
use crate::loader::{ContentLoader, ContentSource};
use crate::progress::ProgressCallback;
use crate::services::Services;

/// Which artifact to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Pdf,
    Pptx,
}

impl ExportFormat {
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Pptx => "PowerPoint",
        }
    }
}

/// Error type for pipeline runs. Loading and inlining cannot fail; only
/// the export step can.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a completed pipeline run.
#[derive(Debug)]
pub struct ExportOutcome {
    pub path: PathBuf,
    /// Pages (PDF) or slides (PPTX).
    pub units: usize,
    pub source: ContentSource,
    pub topic: String,
    pub elapsed_seconds: f64,
}

/// The export pipeline.
pub struct ExportPipeline<'a> {
    services: &'a Services,
    title_override: Option<String>,
}

impl<'a> ExportPipeline<'a> {
    pub fn new(services: &'a Services) -> Self {
        Self {
            services,
            title_override: None,
        }
    }

    /// Force the export title instead of deriving it from the loaded
    /// document.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title_override = Some(title.into());
        self
    }

    /// Run load → inline → export and return the artifact.
    pub async fn run<P: ProgressCallback>(
        &self,
        request: &GenerationRequest,
        format: ExportFormat,
        out_dir: &Path,
        progress: &P,
    ) -> Result<ExportOutcome, PipelineError> {
        let start = Instant::now();

        progress.on_step_start("Loading course content...");
        let loaded = ContentLoader::new(self.services).load(request).await;
        let topic = match &self.title_override {
            Some(title) => title.clone(),
            None => loaded
                .document
                .display_topic()
                .unwrap_or(&request.topic)
                .to_string(),
        };
        progress.on_step_complete("Content", loaded.source.label());

        progress.on_step_start("Inlining images...");
        let blocks = parse_blocks(&loaded.document.content);
        let block_count = blocks.len();
        let blocks = ImageInliner::new(self.services).inline(blocks).await;
        let inlined = blocks.iter().filter(|b| b.is_inlined_image()).count();
        progress.on_step_complete(
            "Images",
            &format!("{} inlined, {} blocks", inlined, block_count),
        );

        std::fs::create_dir_all(out_dir)?;

        progress.on_step_start(&format!("Generating {}...", format.label()));
        let (path, units) = match format {
            ExportFormat::Pdf => {
                let export = PdfExporter::new()?.export(&blocks, &topic, out_dir)?;
                progress.on_step_complete("PDF", &format!("{} pages", export.pages));
                (export.path, export.pages)
            }
            ExportFormat::Pptx => {
                let export = PptxExporter::new().export(&blocks, &topic, out_dir)?;
                progress.on_step_complete("PowerPoint", &format!("{} slides", export.slides));
                (export.path, export.slides)
            }
        };

        Ok(ExportOutcome {
            path,
            units,
            source: loaded.source,
            topic,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::progress::SilentProgress;
    use crate::course::{CourseFormat, Difficulty};

    fn request() -> GenerationRequest {
        GenerationRequest {
            topic: "Fallback Course".into(),
            format: CourseFormat::Ppt,
            language: "en".into(),
            difficulty: Difficulty::Beginner,
        }
    }

    #[tokio::test]
    async fn test_pptx_pipeline_end_to_end_with_demo_content() {
        let tmpdir = tempfile::tempdir().unwrap();
        let services = Services::with_config(AppConfig {
            endpoint: None,
            proxy_base: "http://127.0.0.1:9/raw".into(),
            state_path: tmpdir.path().join("state.json"),
        });

        let outcome = ExportPipeline::new(&services)
            .run(
                &request(),
                ExportFormat::Pptx,
                &tmpdir.path().join("out"),
                &SilentProgress,
            )
            .await
            .unwrap();

        assert_eq!(outcome.source, ContentSource::Demo);
        // Demo content names no topic: the first module title wins.
        assert_eq!(outcome.topic, "Introduction to Web Development");
        assert!(outcome.path.exists());
        assert!(outcome.units >= 2);
    }
}

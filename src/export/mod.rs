//! Export backends
//!
//! Two independent paths produce the downloadable artifacts: a paginated
//! rasterized PDF and a structural PPTX deck. Neither is a fallback for
//! the other; they trade fidelity differently on purpose.

use thiserror::Error;

use crate::render::RenderError;

pub mod pdf;
pub mod pptx;

pub use pdf::{page_offsets, PdfExport, PdfExporter, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
pub use pptx::{pack_blocks, PackOptions, PptxExport, PptxExporter, SlideElement, SlideSpec};

/// Error type for export backends.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    #[error("deck serialization failed: {0}")]
    Deck(String),
}

/// Derive an export filename stem from a topic: whitespace runs become
/// underscores and filesystem-hostile characters are mapped away.
pub fn sanitize_topic(topic: &str) -> String {
    let collapsed = topic.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = collapsed
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();
    if cleaned.is_empty() {
        "course".to_string()
    } else {
        cleaned
    }
}

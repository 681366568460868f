//! courseforge
//!
//! Fetches AI-generated course material (outline, lesson content,
//! quizzes and a video script) from a remote generation endpoint (with
//! local-cache and demo fallbacks), and exports the lesson content to a
//! paginated PDF or a PowerPoint deck.
//!
//! The export pipeline runs in three strictly sequential steps:
//!
//! 1. **Load** ([`loader`]): remote endpoint → saved state → demo content,
//!    never failing outward.
//! 2. **Inline** ([`inliner`]): every remote image in the content tree is
//!    fetched through a CORS-bypass proxy and embedded as a `data:` URI,
//!    concurrently and failure-tolerantly.
//! 3. **Export** ([`export`]): either rasterize-and-paginate (PDF) or
//!    greedily pack blocks onto slides (PPTX). The two paths trade
//!    fidelity differently and neither is a fallback for the other.

pub mod blocks;
pub mod cli;
pub mod config;
pub mod course;
pub mod export;
pub mod inliner;
pub mod loader;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod review;
pub mod services;
pub mod store;

// Re-export the public API surface
pub use blocks::{parse_blocks, to_html, Block};
pub use config::AppConfig;
pub use course::{
    CourseDocument, CourseFormat, CourseModule, Difficulty, GenerationRequest, Quiz,
};
pub use export::{ExportError, PdfExporter, PptxExporter};
pub use inliner::ImageInliner;
pub use loader::{demo_document, ContentLoader, ContentSource, LoadedContent};
pub use pipeline::{ExportFormat, ExportOutcome, ExportPipeline, PipelineError};
pub use services::Services;
pub use store::{StateEnvelope, StateStore};

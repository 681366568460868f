//! Content model loader
//!
//! Produces a [`CourseDocument`] for a generation request, trying sources
//! in strict priority order: configured remote endpoint, then the local
//! store, then built-in demo content. Every failure along the way is
//! logged and means "use the next source"; the loader never fails
//! outward, so the review surface is always renderable.

use thiserror::Error;

use crate::course::{CourseDocument, CourseModule, GenerationRequest, Quiz, ValidationError};
use crate::services::Services;

/// Which source produced the loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Remote,
    Cache,
    Demo,
}

impl ContentSource {
    pub fn label(&self) -> &'static str {
        match self {
            ContentSource::Remote => "generation endpoint",
            ContentSource::Cache => "saved content",
            ContentSource::Demo => "demo content",
        }
    }
}

/// A loaded document together with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedContent {
    pub document: CourseDocument,
    pub source: ContentSource,
}

/// Failures talking to the generation endpoint. Only `regenerate` surfaces
/// these; `load` converts them into fallback.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("no generation endpoint configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("response failed validation: {0}")]
    Invalid(#[from] ValidationError),
}

/// The content model loader.
pub struct ContentLoader<'a> {
    services: &'a Services,
}

impl<'a> ContentLoader<'a> {
    pub fn new(services: &'a Services) -> Self {
        Self { services }
    }

    /// Load a document, falling through remote → store → demo.
    pub async fn load(&self, request: &GenerationRequest) -> LoadedContent {
        if self.services.config.endpoint.is_some() {
            match self.fetch_remote(request).await {
                Ok(document) => {
                    return LoadedContent {
                        document,
                        source: ContentSource::Remote,
                    }
                }
                Err(e) => {
                    log::warn!("generation endpoint unusable, falling back: {}", e);
                }
            }
        }

        if let Some(document) = self.services.store.cached_document() {
            match document.validate() {
                Ok(()) => {
                    return LoadedContent {
                        document,
                        source: ContentSource::Cache,
                    }
                }
                Err(e) => {
                    log::warn!("saved content failed validation, falling back: {}", e);
                }
            }
        }

        log::info!("no endpoint and no saved content; using demo content");
        LoadedContent {
            document: demo_document(),
            source: ContentSource::Demo,
        }
    }

    /// Re-issue the remote request, bypassing every fallback. Callers keep
    /// their existing content when this fails; nothing is overwritten here.
    pub async fn regenerate(
        &self,
        request: &GenerationRequest,
    ) -> Result<CourseDocument, RemoteError> {
        if self.services.config.endpoint.is_none() {
            return Err(RemoteError::NotConfigured);
        }
        self.fetch_remote(request).await
    }

    async fn fetch_remote(&self, request: &GenerationRequest) -> Result<CourseDocument, RemoteError> {
        let endpoint = self
            .services
            .config
            .endpoint
            .as_deref()
            .ok_or(RemoteError::NotConfigured)?;

        let response = self
            .services
            .http
            .post(endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status));
        }

        // Missing top-level fields fail deserialization here, which the
        // caller treats the same as any other unusable response.
        let document: CourseDocument = response.json().await?;
        document.validate()?;
        Ok(document)
    }
}

/// Built-in fallback content, used when no endpoint is configured and
/// nothing has been saved yet.
pub fn demo_document() -> CourseDocument {
    CourseDocument {
        outline: vec![
            CourseModule {
                module: "Introduction to Web Development".into(),
                lessons: vec![
                    "HTML Basics".into(),
                    "CSS Fundamentals".into(),
                    "JavaScript Introduction".into(),
                ],
                duration: "2 hours".into(),
            },
            CourseModule {
                module: "Advanced Frontend".into(),
                lessons: vec![
                    "React Components".into(),
                    "State Management".into(),
                    "API Integration".into(),
                ],
                duration: "3 hours".into(),
            },
        ],
        quizzes: vec![Quiz {
            question: "What does HTML stand for?".into(),
            options: vec![
                "HyperText Markup Language".into(),
                "High Tech Modern Language".into(),
            ],
            correct: 0,
            explanation: "HTML stands for HyperText Markup Language.".into(),
        }],
        script: "# Demo Script\n\nThis is a demo video script used when no server is available."
            .into(),
        content: "<h1>Demo Content</h1>\
                  <p>This is fallback content provided locally.</p>\
                  <h2>Why you are seeing this</h2>\
                  <p>No generation endpoint is configured and nothing has been saved yet.</p>"
            .into(),
        topic: None,
        title: None,
    }
}

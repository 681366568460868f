//! Local persistent state
//!
//! One JSON envelope at a single well-known path holds everything the tool
//! remembers between runs: the recent-courses ledger, the most recently
//! generated document and the descriptor that produced it. Writes are
//! last-write-wins with no locking; the store is single-user by design.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::course::{CourseDocument, GenerationRequest};

/// Error type for state persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// The persisted envelope. Field names stay camelCase on disk, matching
/// the generation service's envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEnvelope {
    #[serde(default)]
    pub recent_courses: Vec<RecentCourse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_generated_content: Option<CourseDocument>,

    /// Descriptor of the last generation, kept so `regenerate` can replay it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_request: Option<GenerationRequest>,
}

/// One line of the recent-courses ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentCourse {
    pub topic: String,
    pub format: String,
    pub language: String,
    /// ISO date (YYYY-MM-DD) of generation.
    pub date: String,
}

/// Handle on the state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the envelope; a missing file is an empty envelope, not an error.
    pub fn load(&self) -> Result<StateEnvelope, StoreError> {
        if !self.path.exists() {
            return Ok(StateEnvelope::default());
        }
        let json = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, envelope: &StateEnvelope) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(envelope)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Record a completed generation: prepend a ledger entry and replace the
    /// current document and descriptor.
    pub fn record_generation(
        &self,
        request: &GenerationRequest,
        document: &CourseDocument,
    ) -> Result<(), StoreError> {
        let mut envelope = self.load().unwrap_or_default();
        envelope.recent_courses.insert(
            0,
            RecentCourse {
                topic: request.topic.clone(),
                format: request.format.tag().to_string(),
                language: crate::course::language_label(&request.language).to_string(),
                date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
            },
        );
        envelope.current_generated_content = Some(document.clone());
        envelope.last_request = Some(request.clone());
        self.save(&envelope)
    }

    /// Replace only the current document, leaving the ledger and descriptor
    /// untouched (used by regeneration).
    pub fn update_current(&self, document: &CourseDocument) -> Result<(), StoreError> {
        let mut envelope = self.load().unwrap_or_default();
        envelope.current_generated_content = Some(document.clone());
        self.save(&envelope)
    }

    /// The cached document, if one is present and readable. Read failures
    /// are logged and reported as absence: the caller falls back.
    pub fn cached_document(&self) -> Option<CourseDocument> {
        match self.load() {
            Ok(envelope) => envelope.current_generated_content,
            Err(e) => {
                log::warn!("could not read saved content from {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// The descriptor of the last recorded generation, if any.
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.load().ok().and_then(|envelope| envelope.last_request)
    }
}

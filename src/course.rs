//! Course document model
//!
//! Domain types for generated course material: the outline modules, the
//! assessment quizzes, the video script and the rich-text lesson content.
//! Field names match the generation service envelope, so these types
//! round-trip through the wire and the local store unchanged.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures for documents arriving from an untrusted source.
///
/// These are boundary rejections: the loader treats them as "use the next
/// source", they are never surfaced past the loader.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("quiz {quiz} has {count} options, need at least 2")]
    TooFewOptions { quiz: usize, count: usize },

    #[error("quiz {quiz}: correct option {correct} out of range (0..{options})")]
    CorrectOutOfRange {
        quiz: usize,
        correct: usize,
        options: usize,
    },
}

/// A complete generated course document.
///
/// All four content fields are mandatory on the wire; a response missing any
/// of them fails deserialization and falls through to the next source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDocument {
    pub outline: Vec<CourseModule>,
    pub quizzes: Vec<Quiz>,
    pub script: String,
    /// Rich-text lesson content, a restricted HTML subset (see [`crate::blocks`]).
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl CourseDocument {
    /// Check the data-integrity invariants that deserialization alone
    /// cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (idx, quiz) in self.quizzes.iter().enumerate() {
            if quiz.options.len() < 2 {
                return Err(ValidationError::TooFewOptions {
                    quiz: idx,
                    count: quiz.options.len(),
                });
            }
            if quiz.correct >= quiz.options.len() {
                return Err(ValidationError::CorrectOutOfRange {
                    quiz: idx,
                    correct: quiz.correct,
                    options: quiz.options.len(),
                });
            }
        }
        Ok(())
    }

    /// Topic to display and to name export files after: the explicit topic
    /// if the generator returned one, else the first module title.
    pub fn display_topic(&self) -> Option<&str> {
        self.topic
            .as_deref()
            .or_else(|| self.outline.first().map(|m| m.module.as_str()))
    }
}

/// One outline module. Module numbering derives from position in the
/// outline, so insertion order is significant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseModule {
    pub module: String,
    pub lessons: Vec<String>,
    pub duration: String,
}

/// A single multiple-choice quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`. Must be in range; see [`CourseDocument::validate`].
    pub correct: usize,
    pub explanation: String,
}

/// Request descriptor sent to the generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: String,
    pub format: CourseFormat,
    pub language: String,
    pub difficulty: Difficulty,
}

/// Output format the user asked the generator for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CourseFormat {
    Pdf,
    Ppt,
    Micro,
    Video,
}

impl CourseFormat {
    /// Short uppercase tag used in the recent-courses ledger.
    pub fn tag(&self) -> &'static str {
        match self {
            CourseFormat::Pdf => "PDF",
            CourseFormat::Ppt => "PPT",
            CourseFormat::Micro => "MICRO",
            CourseFormat::Video => "VIDEO",
        }
    }
}

impl std::fmt::Display for CourseFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CourseFormat::Pdf => "pdf",
            CourseFormat::Ppt => "ppt",
            CourseFormat::Micro => "micro",
            CourseFormat::Video => "video",
        })
    }
}

/// Requested difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        })
    }
}

/// Human-readable label for a course language code.
///
/// Unknown codes fall back to the code itself.
pub fn language_label(code: &str) -> &str {
    match code {
        "en" => "English",
        "hi" => "Hindi",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "pt" => "Portuguese",
        "ar" => "Arabic",
        "zh" => "Chinese",
        other => other,
    }
}

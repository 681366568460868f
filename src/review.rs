//! Textual review rendering
//!
//! Renders the four review tabs (outline, lesson content, quizzes and
//! video script) as plain text. Module and question numbering derives
//! from position, and lesson order is preserved exactly.

use std::fmt::Write as FmtWrite;

use crate::blocks::{parse_blocks, Block};
use crate::course::{CourseModule, Quiz};

/// Render the course outline: one numbered header per module, lessons in
/// insertion order.
pub fn render_outline(modules: &[CourseModule]) -> String {
    let mut out = String::new();
    for (index, module) in modules.iter().enumerate() {
        writeln!(out, "Module {}: {}", index + 1, module.module).ok();
        writeln!(
            out,
            "  {} | {} lessons",
            module.duration,
            module.lessons.len()
        )
        .ok();
        for lesson in &module.lessons {
            writeln!(out, "  - {}", lesson).ok();
        }
        writeln!(out).ok();
    }
    out
}

/// Render the assessment quizzes with lettered options; the correct option
/// is marked and followed by the explanation.
pub fn render_quizzes(quizzes: &[Quiz]) -> String {
    let mut out = String::new();
    for (index, quiz) in quizzes.iter().enumerate() {
        writeln!(out, "Question {}", index + 1).ok();
        writeln!(out, "{}", quiz.question).ok();
        for (option_index, option) in quiz.options.iter().enumerate() {
            let letter = (b'A' + option_index as u8) as char;
            let marker = if option_index == quiz.correct { "*" } else { " " };
            writeln!(out, "  {} {}. {}", marker, letter, option).ok();
        }
        writeln!(out, "  Explanation: {}", quiz.explanation).ok();
        writeln!(out).ok();
    }
    out
}

/// Render the video script verbatim, newlines preserved.
pub fn render_script(script: &str) -> String {
    script.to_string()
}

/// Render the lesson content blocks as plain text, with placeholders for
/// images.
pub fn render_content(html: &str) -> String {
    let mut out = String::new();
    for block in parse_blocks(html) {
        match block {
            Block::Heading { text, .. } => {
                writeln!(out, "{}", text).ok();
                writeln!(out, "{}", "=".repeat(text.chars().count().max(1))).ok();
            }
            Block::Paragraph { text } => {
                writeln!(out, "{}", text).ok();
            }
            Block::Image { src, alt } => {
                let label = alt.unwrap_or(src);
                writeln!(out, "[image: {}]", label).ok();
            }
        }
        writeln!(out).ok();
    }
    out
}

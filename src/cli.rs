//! Command-line interface definitions

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::course::{CourseFormat, Difficulty};
use crate::pipeline::ExportFormat;

/// Generate AI course material and export it to PDF or PowerPoint.
#[derive(Parser, Debug)]
#[command(name = "courseforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Override the state file location
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate course material for a topic and save it locally
    Generate(GenerateArgs),

    /// Print one review tab of the saved course
    Show(ShowArgs),

    /// Export the saved course to a downloadable file
    Export(ExportArgs),

    /// Re-request the last generation from the endpoint; existing content
    /// is kept unchanged if the request fails
    Regenerate,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Course topic, e.g. "Digital Payments Security"
    pub topic: String,

    /// Output format to generate for
    #[arg(long, value_enum, default_value_t = CourseFormat::Pdf)]
    pub format: CourseFormat,

    /// Course language code (en, hi, es, fr, de, pt, ar, zh)
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Difficulty level
    #[arg(long, value_enum, default_value_t = Difficulty::Intermediate)]
    pub difficulty: Difficulty,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Which review tab to print
    #[arg(value_enum)]
    pub tab: ReviewTab,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewTab {
    Outline,
    Content,
    Quizzes,
    Script,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Artifact to produce
    #[arg(value_enum)]
    pub format: ExportFormat,

    /// Directory to write the file into
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Override the export title (defaults to the saved topic)
    #[arg(long)]
    pub topic: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "courseforge",
            "generate",
            "Rust Basics",
            "--format",
            "ppt",
            "--language",
            "hi",
            "--difficulty",
            "advanced",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.topic, "Rust Basics");
                assert_eq!(args.format, CourseFormat::Ppt);
                assert_eq!(args.language, "hi");
                assert_eq!(args.difficulty, Difficulty::Advanced);
            }
            other => panic!("expected generate, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_defaults() {
        let cli = Cli::try_parse_from(["courseforge", "export", "pdf"]).unwrap();
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.format, ExportFormat::Pdf);
                assert_eq!(args.out, PathBuf::from("."));
                assert!(args.topic.is_none());
            }
            other => panic!("expected export, got {:?}", other),
        }
    }

    #[test]
    fn test_global_state_flag() {
        let cli =
            Cli::try_parse_from(["courseforge", "show", "outline", "--state", "/tmp/s.json"])
                .unwrap();
        assert_eq!(cli.state, Some(PathBuf::from("/tmp/s.json")));
    }
}

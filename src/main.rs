//! courseforge CLI entry point

use anyhow::{bail, Context, Result};
use clap::Parser;

use courseforge::cli::{Cli, Commands, ExportArgs, GenerateArgs, ReviewTab, ShowArgs};
use courseforge::config::AppConfig;
use courseforge::course::{CourseFormat, Difficulty, GenerationRequest};
use courseforge::loader::ContentLoader;
use courseforge::pipeline::ExportPipeline;
use courseforge::progress::ConsoleProgress;
use courseforge::review;
use courseforge::services::Services;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = AppConfig::load();
    if let Some(state) = cli.state {
        config.state_path = state;
    }
    let services = Services::initialize(config);

    match cli.command {
        Commands::Generate(args) => cmd_generate(&services, args).await,
        Commands::Show(args) => cmd_show(&services, args).await,
        Commands::Export(args) => cmd_export(&services, args).await,
        Commands::Regenerate => cmd_regenerate(&services).await,
    }
}

/// Descriptor to use when nothing has been generated yet.
fn fallback_request() -> GenerationRequest {
    GenerationRequest {
        topic: "C# programming".into(),
        format: CourseFormat::Ppt,
        language: "hi".into(),
        difficulty: Difficulty::Intermediate,
    }
}

fn stored_or_fallback_request(services: &Services) -> GenerationRequest {
    services.store.last_request().unwrap_or_else(fallback_request)
}

async fn cmd_generate(services: &Services, args: GenerateArgs) -> Result<()> {
    let request = GenerationRequest {
        topic: args.topic,
        format: args.format,
        language: args.language,
        difficulty: args.difficulty,
    };

    let loaded = ContentLoader::new(services).load(&request).await;
    services
        .store
        .record_generation(&request, &loaded.document)
        .with_context(|| {
            format!(
                "failed to save course to {}",
                services.store.path().display()
            )
        })?;

    println!(
        "Generated \"{}\" from {} ({} modules, {} quizzes)",
        loaded.document.display_topic().unwrap_or(&request.topic),
        loaded.source.label(),
        loaded.document.outline.len(),
        loaded.document.quizzes.len()
    );
    println!();
    print!("{}", review::render_outline(&loaded.document.outline));
    Ok(())
}

async fn cmd_show(services: &Services, args: ShowArgs) -> Result<()> {
    let request = stored_or_fallback_request(services);
    let loaded = ContentLoader::new(services).load(&request).await;

    let rendered = match args.tab {
        ReviewTab::Outline => review::render_outline(&loaded.document.outline),
        ReviewTab::Content => review::render_content(&loaded.document.content),
        ReviewTab::Quizzes => review::render_quizzes(&loaded.document.quizzes),
        ReviewTab::Script => review::render_script(&loaded.document.script),
    };
    print!("{}", rendered);
    Ok(())
}

async fn cmd_export(services: &Services, args: ExportArgs) -> Result<()> {
    let request = stored_or_fallback_request(services);

    let mut pipeline = ExportPipeline::new(services);
    if let Some(title) = args.topic {
        pipeline = pipeline.with_title(title);
    }

    let progress = ConsoleProgress::new();
    let outcome = pipeline
        .run(&request, args.format, &args.out, &progress)
        .await
        .context("export failed")?;

    println!(
        "Exported \"{}\" to {} ({} {}, {:.1}s)",
        outcome.topic,
        outcome.path.display(),
        outcome.units,
        match args.format {
            courseforge::pipeline::ExportFormat::Pdf => "pages",
            courseforge::pipeline::ExportFormat::Pptx => "slides",
        },
        outcome.elapsed_seconds
    );
    Ok(())
}

async fn cmd_regenerate(services: &Services) -> Result<()> {
    let Some(request) = services.store.last_request() else {
        bail!("nothing to regenerate; run `courseforge generate` first");
    };

    match ContentLoader::new(services).regenerate(&request).await {
        Ok(document) => {
            services
                .store
                .update_current(&document)
                .context("failed to save regenerated course")?;
            println!(
                "Regenerated \"{}\" ({} modules, {} quizzes)",
                document.display_topic().unwrap_or(&request.topic),
                document.outline.len(),
                document.quizzes.len()
            );
            Ok(())
        }
        Err(e) => {
            // Existing content stays in place; the failure is a notification.
            bail!("regeneration failed, existing content kept: {}", e);
        }
    }
}

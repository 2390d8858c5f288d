mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "copydeck-cli")]
#[command(about = "Strategic analytics for marketing copy")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the copy comes from: inline or a file.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct ContentInput {
    /// Copy to analyze, inline
    #[arg(long)]
    content: Option<String>,
    /// Read the copy from a file
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build (or fetch from cache) the analytics report for a piece of copy
    Analyze {
        /// Comma-separated keywords the copy targets
        #[arg(long)]
        topic: String,
        /// Output format the copy is written for, part of the cache key
        #[arg(long, default_value = "default")]
        format: String,
        #[command(flatten)]
        input: ContentInput,
        /// Print CSV instead of JSON
        #[arg(long)]
        csv: bool,
    },
    /// Drop the cached report for a piece of copy
    Invalidate {
        #[arg(long, default_value = "default")]
        format: String,
        #[command(flatten)]
        input: ContentInput,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = copydeck_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // Logs go to stderr so report output on stdout stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let orchestrator = copydeck_analytics::AnalysisOrchestrator::from_config(&config)?;

    match cli.command {
        Commands::Analyze {
            topic,
            format,
            input,
            csv,
        } => {
            let content = commands::read_content(input.content, input.file.as_deref())?;
            let output = commands::run_analyze(&orchestrator, &content, &topic, &format, csv).await?;
            println!("{output}");
        }
        Commands::Invalidate { format, input } => {
            let content = commands::read_content(input.content, input.file.as_deref())?;
            commands::run_invalidate(&orchestrator, &content, &format).await?;
            println!("cached report removed");
        }
    }

    Ok(())
}

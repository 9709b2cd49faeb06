//! Arbor CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Incremental architecture dependency graphs for source trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (searched upward from the working directory when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for changes, update the graph, render views, save the snapshot
    Update,
    /// Render diff views of the current tree against the saved snapshot
    Diff,
    /// Delete the snapshot directory
    Clear,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("arbor={}", log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Arbor v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Update => commands::update(cli.config).await,
        Commands::Diff => commands::diff(cli.config).await,
        Commands::Clear => commands::clear(cli.config).await,
        Commands::Version => {
            println!("arbor v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

//! Imgpress CLI - batch image optimizer with metadata stamping.
//!
//! Imgpress takes source images, re-encodes them for the web (resize,
//! JPEG/WEBP, white background), and writes standardized descriptive
//! metadata into the outputs via ExifTool.
//!
//! # Usage
//!
//! ```bash
//! # Process a folder into ./optimized
//! imgpress run ./photos --author "Studio" --keywords "signs, acrylic"
//!
//! # Repeat a saved run
//! imgpress run --profile batch.json
//!
//! # Look at what was written
//! imgpress inspect ./optimized/photo-meta.jpg
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Imgpress - batch image transformation and metadata pipeline.
#[derive(Parser, Debug)]
#[command(name = "imgpress")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Transform a batch of images and write metadata into the outputs
    Run(cli::run::RunArgs),

    /// Dump the descriptive metadata of a produced file
    Inspect(cli::inspect::InspectArgs),

    /// Manage run profiles (job policy + defaults + work list)
    Profile(cli::profile::ProfileArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match imgpress_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration."
            );
            imgpress_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Imgpress v{}", imgpress_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Run(args) => cli::run::execute(args, &config).await,
        Commands::Inspect(args) => cli::inspect::execute(args, &config),
        Commands::Profile(args) => cli::profile::execute(args),
    }
}

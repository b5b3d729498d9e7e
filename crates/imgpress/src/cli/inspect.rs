//! The `imgpress inspect` command: dump metadata of a produced file.

use clap::Args;
use imgpress_core::{Config, ExifTool};
use std::path::PathBuf;

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// File to inspect
    pub file: PathBuf,

    /// Path to the ExifTool binary
    #[arg(long)]
    pub exiftool: Option<String>,
}

/// Execute the inspect command.
pub fn execute(args: InspectArgs, config: &Config) -> anyhow::Result<()> {
    if !args.file.exists() {
        anyhow::bail!("File does not exist: {:?}", args.file);
    }

    let tool = ExifTool::new(
        args.exiftool
            .unwrap_or_else(|| config.tool.exiftool_path.clone()),
    );
    let output = tool.dump(&args.file);

    if output.ok() {
        println!("{}", output.stdout);
    } else {
        anyhow::bail!("Metadata dump failed: {}", output.diagnostic());
    }
    Ok(())
}

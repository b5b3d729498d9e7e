//! The `imgpress profile` command: manage run profiles.

use clap::{Args, Subcommand};
use imgpress_core::Profile;
use std::path::PathBuf;

/// Arguments for the `profile` command.
#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

/// Subcommands for profile management.
#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Write a template profile with default policy and empty work list
    Init {
        /// Where to write the profile
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Summarize a profile
    Show {
        /// Profile to read
        path: PathBuf,
    },
}

/// Execute the profile command.
pub fn execute(args: ProfileArgs) -> anyhow::Result<()> {
    match args.command {
        ProfileCommand::Init { path, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Profile already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }
            Profile::default().save(&path)?;
            println!("Profile template written to: {}", path.display());
        }

        ProfileCommand::Show { path } => {
            let profile = Profile::load(&path)?;
            println!("Profile: {}", path.display());
            println!(
                "  Policy:   JPEG q{} / WEBP q{}, max {}x{}",
                profile.job.jpeg_quality,
                profile.job.webp_quality,
                profile.job.max_width,
                profile.job.max_height
            );
            println!(
                "  Flags:    webp={} strip={} dpi96={} overwrite={} rename={} delete_source={}",
                profile.job.make_webp,
                profile.job.strip_existing,
                profile.job.force_dpi,
                profile.job.overwrite,
                profile.job.rename_after_meta,
                profile.job.delete_source
            );
            if let Some(author) = &profile.defaults.author {
                println!("  Author:   {author}");
            }
            if let Some(dir) = &profile.output_dir {
                println!("  Output:   {}", dir.display());
            }
            println!("  Items:    {}", profile.items.len());
            for item in &profile.items {
                println!("    {} -> {}", item.source.display(), item.final_stem());
            }
        }
    }

    Ok(())
}

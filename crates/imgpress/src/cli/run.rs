//! The `imgpress run` command: execute one batch.
//!
//! The batch worker runs in the background; this command's loop drains the
//! progress channel on a fixed 60ms cadence into a progress bar and log
//! lines, so the interface stays responsive while items are processed.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use imgpress_core::{
    progress_channel, BatchOrchestrator, BatchRunner, Config, ExifTool, FileDiscovery, Profile,
    ProgressMessage, RunSummary,
};

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Image files or directories to process (recursive over supported types)
    #[arg(required_unless_present = "profile")]
    pub inputs: Vec<PathBuf>,

    /// Load job policy, batch defaults, and work list from a profile JSON
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Output directory (defaults to the configured one)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to the ExifTool binary
    #[arg(long)]
    pub exiftool: Option<String>,

    /// JPEG encode quality
    #[arg(long, value_parser = clap::value_parser!(u8).range(60..=100))]
    pub jpeg_quality: Option<u8>,

    /// WEBP encode quality
    #[arg(long, value_parser = clap::value_parser!(u8).range(60..=100))]
    pub webp_quality: Option<u8>,

    /// Maximum output width in pixels (0 = unconstrained)
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Maximum output height in pixels (0 = unconstrained)
    #[arg(long)]
    pub max_height: Option<u32>,

    /// Keep transparency instead of flattening onto white
    #[arg(long)]
    pub no_flatten: bool,

    /// Keep PNG/TIFF/WEBP containers instead of converting to JPEG
    #[arg(long)]
    pub no_convert: bool,

    /// Skip the WEBP sibling output
    #[arg(long)]
    pub no_webp: bool,

    /// Keep pre-existing embedded metadata (skip the strip step)
    #[arg(long)]
    pub no_strip: bool,

    /// Skip 96 DPI normalization
    #[arg(long)]
    pub no_dpi: bool,

    /// Delete source files after successful processing
    #[arg(long)]
    pub delete_source: bool,

    /// Fail items whose outputs already exist instead of replacing them
    #[arg(long)]
    pub no_overwrite: bool,

    /// Skip the post-metadata rename (no "-meta" suffix)
    #[arg(long)]
    pub no_rename: bool,

    /// Author / credit applied to all items
    #[arg(long)]
    pub author: Option<String>,

    /// Default title (per-item overrides from a profile win)
    #[arg(long)]
    pub title: Option<String>,

    /// Default alt text
    #[arg(long)]
    pub alt: Option<String>,

    /// Default description
    #[arg(long)]
    pub description: Option<String>,

    /// Default keywords, comma-separated
    #[arg(long)]
    pub keywords: Option<String>,

    /// Copyright notice
    #[arg(long)]
    pub copyright: Option<String>,

    /// License URL (usage terms)
    #[arg(long)]
    pub license_url: Option<String>,

    /// GPS latitude in signed decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// GPS longitude in signed decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// GPS altitude in meters
    #[arg(long, allow_hyphen_values = true)]
    pub altitude: Option<f64>,
}

/// Execute the run command.
pub async fn execute(args: RunArgs, config: &Config) -> anyhow::Result<()> {
    // Start from the profile when given, defaults otherwise; CLI flags win.
    let mut profile = match &args.profile {
        Some(path) => Profile::load(path)
            .map_err(|e| anyhow::anyhow!("Cannot load profile {:?}: {e}", path))?,
        None => Profile::default(),
    };
    apply_cli_overrides(&mut profile, &args);
    profile.job.validate()?;

    let mut items = profile.items.clone();
    items.extend(FileDiscovery::work_items(&args.inputs));
    if items.is_empty() {
        tracing::warn!("No supported image files to process");
        return Ok(());
    }
    tracing::info!("Found {} image(s) to process", items.len());

    let out_dir = resolve_output_dir(&profile, &args, config);
    let exiftool = resolve_exiftool(&profile, &args, config);

    let (tx, mut rx) = progress_channel();
    let orchestrator = BatchOrchestrator::new(
        profile.job.clone(),
        profile.defaults.clone(),
        &out_dir,
        ExifTool::new(exiftool),
        tx,
    );

    // Ctrl-C stops the worker after the current item reaches a terminal state
    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Cancellation requested - finishing the current item");
            cancel.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    });

    let total = items.len() as u64;
    let handle = BatchRunner::new().spawn(orchestrator, items)?;

    // Poll-and-drain loop: everything queued is consumed per tick, in
    // emission order.
    let progress = create_progress_bar(total);
    let mut interval = tokio::time::interval(Duration::from_millis(60));
    'poll: loop {
        interval.tick().await;
        for message in rx.drain() {
            match message {
                ProgressMessage::Log(line) => progress.println(format!("  {line}")),
                ProgressMessage::Progress { done, .. } => progress.set_position(done as u64),
                ProgressMessage::Done(_) => break 'poll,
            }
        }
    }
    progress.finish_and_clear();

    let summary = handle.join().await?;
    print_summary(&summary, &out_dir);
    Ok(())
}

/// Fold CLI flags over the profile. Flags touch only what they name.
fn apply_cli_overrides(profile: &mut Profile, args: &RunArgs) {
    let job = &mut profile.job;
    if let Some(q) = args.jpeg_quality {
        job.jpeg_quality = q;
    }
    if let Some(q) = args.webp_quality {
        job.webp_quality = q;
    }
    if let Some(w) = args.max_width {
        job.max_width = w;
    }
    if let Some(h) = args.max_height {
        job.max_height = h;
    }
    if args.no_flatten {
        job.flatten_background = false;
    }
    if args.no_convert {
        job.convert_to_jpeg = false;
    }
    if args.no_webp {
        job.make_webp = false;
    }
    if args.no_strip {
        job.strip_existing = false;
    }
    if args.no_dpi {
        job.force_dpi = false;
    }
    if args.delete_source {
        job.delete_source = true;
    }
    if args.no_overwrite {
        job.overwrite = false;
    }
    if args.no_rename {
        job.rename_after_meta = false;
    }

    let defaults = &mut profile.defaults;
    if args.author.is_some() {
        defaults.author = args.author.clone();
    }
    if args.title.is_some() {
        defaults.title = args.title.clone();
    }
    if args.alt.is_some() {
        defaults.alt_text = args.alt.clone();
    }
    if args.description.is_some() {
        defaults.description = args.description.clone();
    }
    if args.keywords.is_some() {
        defaults.keywords = args.keywords.clone();
    }
    if args.copyright.is_some() {
        defaults.copyright = args.copyright.clone();
    }
    if args.license_url.is_some() {
        defaults.license_url = args.license_url.clone();
    }
    if args.lat.is_some() {
        defaults.gps_latitude = args.lat;
    }
    if args.lon.is_some() {
        defaults.gps_longitude = args.lon;
    }
    if args.altitude.is_some() {
        defaults.gps_altitude = args.altitude;
    }
}

/// Output directory precedence: flag, then profile, then app config.
fn resolve_output_dir(profile: &Profile, args: &RunArgs, config: &Config) -> PathBuf {
    if let Some(output) = &args.output {
        return PathBuf::from(shellexpand::tilde(output).into_owned());
    }
    if let Some(dir) = &profile.output_dir {
        return dir.clone();
    }
    config.output_dir()
}

/// ExifTool path precedence: flag, then profile, then app config.
fn resolve_exiftool(profile: &Profile, args: &RunArgs, config: &Config) -> String {
    args.exiftool
        .clone()
        .or_else(|| profile.exiftool.clone())
        .unwrap_or_else(|| config.tool.exiftool_path.clone())
}

/// Create a progress bar for the batch.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb
}

/// Print a formatted summary table after the run.
fn print_summary(summary: &RunSummary, out_dir: &std::path::Path) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", summary.succeeded);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    if summary.cancelled {
        eprintln!("    (run cancelled before completion)");
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", summary.elapsed_seconds);
    eprintln!("    Output dir:   {}", out_dir.display());
    eprintln!("  ====================================");
}

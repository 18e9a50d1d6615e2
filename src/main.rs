//! Entrainment Stimulus Toolkit CLI
//!
//! Generates flicker stimulus clips and extracts luminance or motion
//! signals from recorded stimulus videos.

use clap::{Args, Parser, Subcommand};
use entrain_stim::{
    analysis::SignalKind,
    config::FileConfig,
    generation::{clip_name, ConcatPlaylistSink, StimulusGenerator},
    metrics::MetricsRegistry,
    pipeline::run_batch,
    source::{FrameSource, ImageSequenceSource},
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "entrain-stim", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a flicker stimulus clip from still images
    Generate(GenerateArgs),
    /// Extract mean luminance from recordings
    Luminance(ExtractArgs),
    /// Extract inter-frame motion from recordings
    Motion(ExtractArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Output directory for the playlist and stills
    #[arg(short, long)]
    output: PathBuf,

    /// Clip name (defaults to the output directory name)
    #[arg(long)]
    name: Option<String>,

    /// Flicker frequency in Hz
    #[arg(long)]
    frequency: Option<f64>,

    /// Display refresh rate in Hz
    #[arg(long)]
    refresh_rate: Option<f64>,

    /// Clip duration in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Stimulus images, shown in the given order
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Output directory for the CSV tables
    #[arg(short, long)]
    output: PathBuf,

    /// Resample onto this rate in Hz
    #[arg(long, conflicts_with = "per_frame")]
    sampling_rate: Option<u32>,

    /// Emit one value per frame instead of resampling
    #[arg(long)]
    per_frame: bool,

    /// Leading frames to drop
    #[arg(long)]
    skip: Option<u64>,

    /// Motion noise threshold (0-255)
    #[arg(long)]
    threshold: Option<f64>,

    /// Frame rate of the image sequences
    #[arg(long)]
    fps: Option<f64>,

    /// Apply the configured exclusion regions
    #[arg(long)]
    exclusions: bool,

    /// Write Prometheus metrics to this file at the end of the run
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// Write the batch summary as TOML to this file
    #[arg(long)]
    summary_out: Option<PathBuf>,

    /// Recordings, each a directory of exported frames
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<FileConfig, Box<dyn Error>> {
    Ok(match path {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    })
}

fn generate(mut config: FileConfig, args: GenerateArgs) -> Result<(), Box<dyn Error>> {
    if let Some(frequency) = args.frequency {
        config.generation.requested_frequency = frequency;
    }
    if let Some(refresh_rate) = args.refresh_rate {
        config.generation.refresh_rate = refresh_rate;
    }
    if let Some(duration) = args.duration {
        config.generation.duration = duration;
    }
    config.validate()?;

    let name = args.name.unwrap_or_else(|| clip_name(&args.output));
    let mut sink = ConcatPlaylistSink::new(&args.output, name);
    let report = StimulusGenerator::new(config.generation).render_files(&args.images, &mut sink)?;

    println!(
        "Stimulus clip created: {} ({:.4} Hz, {} frames per half cycle)",
        report.output.display(),
        report.plan.actual_frequency,
        report.plan.frames_per_half_cycle
    );
    if let Some(adjustment) = report.plan.frequency_adjustment() {
        println!(
            "Corrected stimulus frequency is {:.4} Hz (requested {} Hz)",
            adjustment.actual, adjustment.requested
        );
    }
    Ok(())
}

fn extract(
    mut config: FileConfig,
    kind: SignalKind,
    args: ExtractArgs,
    cancel: &AtomicBool,
) -> Result<(), Box<dyn Error>> {
    if let Some(sampling_rate) = args.sampling_rate {
        config.analysis.sampling_rate = sampling_rate;
        config.analysis.run_over_time = true;
    }
    if args.per_frame {
        config.analysis.run_over_time = false;
    }
    if let Some(skip) = args.skip {
        config.analysis.skip_starting_frames = skip;
    }
    if let Some(threshold) = args.threshold {
        config.analysis.motion_threshold = threshold;
    }
    if let Some(fps) = args.fps {
        config.analysis.source_frame_rate = fps;
    }
    if args.exclusions {
        config.exclusions.enabled = true;
    }
    config.validate()?;

    let config = config;
    let metrics = MetricsRegistry::new()?;
    let fps = config.analysis.source_frame_rate;

    let summary = run_batch(
        &args.inputs,
        kind,
        &config,
        &args.output,
        |path| {
            ImageSequenceSource::open(path, fps).map(|s| Box::new(s) as Box<dyn FrameSource>)
        },
        Some(&metrics),
        cancel,
    )?;
    summary.log();

    if let Some(path) = &args.metrics_out {
        std::fs::write(path, metrics.encode()?)?;
    }
    if let Some(path) = &args.summary_out {
        std::fs::write(path, summary.to_toml()?)?;
    }

    println!(
        "{} recordings processed, {} skipped",
        summary.processed.len(),
        summary.skipped.len()
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    info!("Entrainment Stimulus Toolkit v{}", entrain_stim::VERSION);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let result = match cli.command {
        Command::Generate(args) => generate(config, args),
        Command::Luminance(args) => extract(config, SignalKind::Luminance, args, &cancel),
        Command::Motion(args) => extract(config, SignalKind::Motion, args, &cancel),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

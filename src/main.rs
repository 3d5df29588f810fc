//! IR marker tracker: locate and follow three collinear infrared markers in a video.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ir_marker_tracker::app::TrackerApp;
use ir_marker_tracker::config::{Config, DetectionMode, EXAMPLE_CONFIG};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Fusion,
    Strict,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video file to process
    #[arg(required_unless_present = "write_config")]
    video: Option<PathBuf>,

    /// Output directory for reports and frames
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    max_frames: Option<u64>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Detection mode
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Smoothing filter (kalman, none)
    #[arg(long)]
    filter: Option<String>,

    /// Do not open a preview window
    #[arg(long)]
    no_display: bool,

    /// Save every annotated frame as an image
    #[arg(long)]
    save_frames: bool,

    /// Write an annotated video to this path
    #[arg(long)]
    overlay_video: Option<PathBuf>,

    /// Frame rate to assume when the video reports none
    #[arg(long)]
    fps: Option<f64>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Write the example configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path).with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(mode) = args.mode {
        config.geometry.mode = match mode {
            Mode::Fusion => DetectionMode::Fusion,
            Mode::Strict => DetectionMode::Strict,
        };
    }
    if let Some(filter) = &args.filter {
        config.smoothing.filter.clone_from(filter);
    }
    if let Some(output) = &args.output {
        config.output.directory.clone_from(output);
    }
    if let Some(fps) = args.fps {
        config.output.fallback_fps = fps;
    }
    if let Some(path) = &args.overlay_video {
        config.output.overlay_video = Some(path.clone());
    }
    config.output.save_frames |= args.save_frames;
    config.output.display = !args.no_display;

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if let Some(path) = &args.write_config {
        std::fs::write(path, EXAMPLE_CONFIG).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Example configuration written to {}", path.display());
        return Ok(());
    }

    let config = build_config(&args)?;
    let video = args.video.clone().context("No video file given")?;

    let mut app = TrackerApp::new(config, &video, args.max_frames)?;
    let statistics = app.run()?;

    for identity in &statistics.identities {
        match (identity.mean_position, identity.std_deviation) {
            (Some((x, y)), Some(std)) => {
                info!("Marker {}: ({x:.2}, {y:.2}) px, sigma {std:.4} px", identity.id + 1);
            }
            _ => info!("Marker {}: not detected", identity.id + 1),
        }
    }

    Ok(())
}

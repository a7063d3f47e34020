use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{debug, info};

use mediaqc_core::error::Result;
use mediaqc_core::{
    run_analysis, AnalysisConfig, CancellationToken, EventDispatcher, FfmpegEngine, MediaEngine,
    QcError,
};

mod logging;
mod output;

#[derive(Parser)]
#[command(author, version, about = "Media quality-control analyzer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a media file for quality-control defects
    Analyze {
        /// Path to the media file to analyze
        #[arg(short, long)]
        input: PathBuf,

        /// Number of audio channels to check (used when probing cannot
        /// determine the decoded count)
        #[arg(short, long)]
        channels: u32,

        /// Silence level in dB below which audio counts as mute
        #[arg(long)]
        mute_threshold_db: Option<f64>,

        /// Minimum silence duration in seconds before a mute is reported
        #[arg(long)]
        mute_min_duration: Option<f64>,

        /// Shots shorter than this many frames are flagged
        #[arg(long)]
        shot_min_frames: Option<u32>,

        /// Scene-cut detection sensitivity (0.0-1.0)
        #[arg(long)]
        scene_threshold: Option<f64>,

        /// Peak amplitude threshold in dBFS
        #[arg(long)]
        peak_threshold_dbfs: Option<f64>,

        /// Maximum duration in seconds for a short peak
        #[arg(long)]
        peak_max_duration: Option<f64>,

        /// Fraction of dark pixels for a frame to count as black
        #[arg(long)]
        black_pixel_threshold: Option<f64>,

        /// Picture-level darkness threshold for black detection
        #[arg(long)]
        black_picture_threshold: Option<f64>,

        /// Kill any single engine invocation exceeding this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Emit the report as JSON on stdout instead of the styled view
        #[arg(long)]
        json: bool,
    },

    /// Check that the media engine is available and print its version
    EngineInfo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    info!("mediaqc v{} starting up", mediaqc_core::VERSION);

    match cli.command {
        Commands::Analyze {
            input,
            channels,
            mute_threshold_db,
            mute_min_duration,
            shot_min_frames,
            scene_threshold,
            peak_threshold_dbfs,
            peak_max_duration,
            black_pixel_threshold,
            black_picture_threshold,
            timeout,
            json,
        } => {
            if channels == 0 {
                return Err(QcError::Config(
                    "Channel count must be at least 1".to_string(),
                ));
            }

            let mut config = AnalysisConfig::default();
            if let Some(v) = mute_threshold_db {
                config.mute_threshold_db = v;
            }
            if let Some(v) = mute_min_duration {
                config.mute_min_duration = v;
            }
            if let Some(v) = shot_min_frames {
                config.shot_min_frames = v;
            }
            if let Some(v) = scene_threshold {
                config.scene_threshold = v;
            }
            if let Some(v) = peak_threshold_dbfs {
                config.peak_threshold_dbfs = v;
            }
            if let Some(v) = peak_max_duration {
                config.peak_max_duration = v;
            }
            if let Some(v) = black_pixel_threshold {
                config.black_pixel_threshold = v;
            }
            if let Some(v) = black_picture_threshold {
                config.black_picture_threshold = v;
            }
            config.validate()?;
            debug!("Configuration: {:?}", config);

            let mut engine = FfmpegEngine::new();
            if let Some(seconds) = timeout {
                engine = engine.with_timeout(Duration::from_secs(seconds));
            }

            let mut events = EventDispatcher::new();
            if !json {
                events.add_handler(Arc::new(output::TerminalEventHandler));
            }

            let cancel = CancellationToken::new();
            let report = run_analysis(&engine, &input, channels, &config, &events, &cancel)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report)
                        .map_err(|e| QcError::ExternalTool(format!("Report encoding failed: {}", e)))?
                );
            } else {
                output::render_report(&report);
            }
        }

        Commands::EngineInfo => {
            let engine = FfmpegEngine::new();
            match engine.verify() {
                Ok(()) => println!("Media engine available: {}", engine.version()?),
                Err(e) => println!("Media engine is not available: {}", e),
            }
        }
    }

    info!("mediaqc completed successfully");
    Ok(())
}

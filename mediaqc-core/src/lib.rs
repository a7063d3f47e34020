//! Core library for automated media quality-control analysis.
//!
//! Drives an external media engine (ffmpeg/ffprobe) to find four classes
//! of defects in a video/audio file: prolonged channel silence, shots
//! shorter than a frame threshold, brief strong audio peaks, and black
//! video intervals. Findings are aggregated into an ordered [`Report`];
//! progress streams through an [`EventDispatcher`].
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use mediaqc_core::{
//!     run_analysis, AnalysisConfig, CancellationToken, EventDispatcher, FfmpegEngine,
//! };
//! use std::path::Path;
//!
//! let engine = FfmpegEngine::new();
//! let config = AnalysisConfig::default();
//! let events = EventDispatcher::new();
//! let cancel = CancellationToken::new();
//!
//! let report = run_analysis(
//!     &engine,
//!     Path::new("delivery.mxf"),
//!     8,
//!     &config,
//!     &events,
//!     &cancel,
//! ).unwrap();
//!
//! for finding in report.findings() {
//!     println!("{}", finding);
//! }
//! ```

pub mod analysis;
pub mod command;
pub mod config;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod metadata;
pub mod report;

// Re-exports for public API
pub use analysis::{run_analysis, CancellationToken};
pub use config::AnalysisConfig;
pub use engine::{FfmpegEngine, FilterKind, MediaEngine, ProbeData};
pub use error::{QcError, Result};
pub use events::{Event, EventDispatcher, EventHandler};
pub use metadata::StreamMetadata;
pub use report::{Category, DetectorOutcome, DetectorReport, Finding, Report};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

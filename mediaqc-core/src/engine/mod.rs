//! The boundary to the external media engine (ffmpeg/ffprobe).
//!
//! The core never shells out directly from detector code: everything the
//! pipeline needs from the engine is expressed by the [`MediaEngine`]
//! trait, and [`FfmpegEngine`] is the production implementation driving
//! one-shot ffmpeg/ffprobe subprocesses. Tests substitute their own
//! implementation to run the pipeline without media files or binaries.

use std::io;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;

use crate::command;
use crate::error::{QcError, Result};

pub mod diagnostics;

pub use diagnostics::{DiagnosticEvent, LineScanner};

/// A filter-style analysis the engine can run over a media file.
///
/// Each variant carries the parameters the underlying filter needs; the
/// diagnostic phrasing it produces is paired with a scanner in
/// [`diagnostics`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    /// Silence detection, optionally restricted to a single audio channel
    /// (0-based).
    SilenceDetect {
        channel: Option<u32>,
        noise_db: f64,
        min_duration: f64,
    },
    /// Scene-cut detection at the given sensitivity (0.0-1.0).
    SceneDetect { threshold: f64 },
    /// Black-interval detection with zero minimum duration.
    BlackDetect {
        pixel_threshold: f64,
        picture_threshold: f64,
    },
}

impl FilterKind {
    /// The ffmpeg filter flag and filtergraph for this analysis.
    pub(crate) fn filter_args(&self) -> (&'static str, String) {
        match self {
            FilterKind::SilenceDetect {
                channel,
                noise_db,
                min_duration,
            } => {
                let graph = match channel {
                    // Extract one channel so silences localize to it
                    Some(c) => format!(
                        "pan=mono|c0=c{},silencedetect=noise={}dB:d={}",
                        c, noise_db, min_duration
                    ),
                    None => format!("silencedetect=noise={}dB:d={}", noise_db, min_duration),
                };
                ("-af", graph)
            }
            FilterKind::SceneDetect { threshold } => (
                "-vf",
                format!("select='gt(scene,{})',showinfo", threshold),
            ),
            FilterKind::BlackDetect {
                pixel_threshold,
                picture_threshold,
            } => (
                "-vf",
                format!(
                    "blackdetect=d=0:pic_th={}:pix_th={}",
                    picture_threshold, pixel_threshold
                ),
            ),
        }
    }

    /// The scanner matching this filter's diagnostic line format.
    pub(crate) fn scanner(&self) -> LineScanner {
        match self {
            FilterKind::SilenceDetect { .. } => diagnostics::silence_scanner(),
            FilterKind::SceneDetect { .. } => diagnostics::scene_scanner(),
            FilterKind::BlackDetect { .. } => diagnostics::black_scanner(),
        }
    }
}

/// Structured stream facts from a metadata probe, before defaulting.
///
/// All fields are optional: the resolver in [`crate::metadata`] owns the
/// fallback policy, this type only reports what the engine saw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeData {
    /// Video frame rate as a rational string, e.g. "30000/1001"
    pub frame_rate: Option<String>,
    /// Duration reported on the video stream, in seconds
    pub video_duration: Option<f64>,
    /// Duration reported on the container, in seconds
    pub container_duration: Option<f64>,
    /// Audio sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Decoded audio channel count
    pub channels: Option<u32>,
}

/// Abstraction over the external media engine.
///
/// Exactly the operations the pipeline consumes: a metadata probe, filter
/// runs yielding diagnostic events, and a raw audio decode. Implementations
/// are expected to be stateless between calls.
pub trait MediaEngine {
    /// Confirm the engine's tooling is present before analysis starts.
    fn verify(&self) -> Result<()> {
        Ok(())
    }

    /// Probe stream metadata for a media file.
    fn probe_streams(&self, path: &Path) -> Result<ProbeData>;

    /// Run a filter analysis and return its extracted diagnostic events.
    fn run_filter(&self, path: &Path, filter: &FilterKind) -> Result<Vec<DiagnosticEvent>>;

    /// Decode the file's audio to interleaved f32 samples at the given rate.
    fn decode_audio(&self, path: &Path, sample_rate: u32) -> Result<Vec<f32>>;
}

/// Production engine invoking ffmpeg and ffprobe as subprocesses.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg: String,
    ffprobe: String,
    timeout: Option<Duration>,
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegEngine {
    /// Engine resolving `ffmpeg`/`ffprobe` from the PATH.
    pub fn new() -> Self {
        Self::with_binaries("ffmpeg", "ffprobe")
    }

    /// Engine using explicit binary paths (bundled deployments).
    pub fn with_binaries(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            timeout: None,
        }
    }

    /// Kill any single engine invocation that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// First line of `ffmpeg -version` output.
    pub fn version(&self) -> Result<String> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-version");

        let output = command::run_checked(&mut cmd, self.timeout)?;
        let version = String::from_utf8_lossy(&output.stdout);
        Ok(version.lines().next().unwrap_or_default().to_string())
    }
}

impl MediaEngine for FfmpegEngine {
    fn verify(&self) -> Result<()> {
        check_dependency(&self.ffmpeg)?;
        check_dependency(&self.ffprobe)?;
        Ok(())
    }

    fn probe_streams(&self, path: &Path) -> Result<ProbeData> {
        if !path.exists() {
            return Err(QcError::MediaFile(format!("File not found: {:?}", path)));
        }

        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path);

        let output = command::run_checked(&mut cmd, self.timeout)?;
        parse_probe_json(&String::from_utf8_lossy(&output.stdout))
    }

    fn run_filter(&self, path: &Path, filter: &FilterKind) -> Result<Vec<DiagnosticEvent>> {
        let (flag, graph) = filter.filter_args();

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-hide_banner")
            .arg("-i")
            .arg(path)
            .args([flag, &graph, "-f", "null", "-"]);

        // Filter diagnostics arrive on stderr; a non-zero exit still may
        // have produced a complete event stream, so the scan happens
        // regardless and the status is only logged.
        let output = command::run(&mut cmd, self.timeout)?;
        if !output.status.success() {
            warn!(
                "Filter run '{}' exited with {}, scanning captured diagnostics anyway",
                graph,
                output.status.code().unwrap_or(-1)
            );
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let events = filter.scanner().scan(&stderr);
        debug!("Filter '{}' produced {} events", graph, events.len());
        Ok(events)
    }

    fn decode_audio(&self, path: &Path, sample_rate: u32) -> Result<Vec<f32>> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-v", "error", "-i"])
            .arg(path)
            .args([
                "-vn",
                "-f",
                "f32le",
                "-acodec",
                "pcm_f32le",
                "-ar",
                &sample_rate.to_string(),
                "-",
            ]);

        let output = command::run(&mut cmd, self.timeout)?;

        if output.stdout.is_empty() {
            return Err(QcError::ExternalTool(format!(
                "Audio decode produced no samples: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        if !output.status.success() {
            warn!(
                "Audio decode exited with {} after producing {} bytes; using what was decoded",
                output.status.code().unwrap_or(-1),
                output.stdout.len()
            );
        }

        Ok(samples_from_bytes(&output.stdout))
    }
}

/// Checks that a required external command is available and executable.
pub fn check_dependency(cmd_name: &str) -> Result<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status();

    match result {
        Ok(status) if status.success() => {
            debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Ok(status) => Err(QcError::ExternalTool(format!(
            "'{}' version check exited with {}",
            cmd_name,
            status.code().unwrap_or(-1)
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Dependency '{}' not found", cmd_name);
            Err(QcError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => Err(QcError::CommandStart(cmd_name.to_string(), e)),
    }
}

/// Reinterpret a little-endian f32 PCM byte stream as samples.
///
/// A trailing partial sample (stream truncated mid-write) is dropped.
pub(crate) fn samples_from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

// ---- ffprobe JSON schema ----

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse ffprobe's JSON output into [`ProbeData`].
///
/// The first video stream supplies the frame rate and stream duration, the
/// first audio stream the sample rate and channel count. ffprobe encodes
/// most numerics as strings; anything unparseable is simply absent.
pub(crate) fn parse_probe_json(json: &str) -> Result<ProbeData> {
    let parsed: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| QcError::ExternalTool(format!("Failed to parse ffprobe output: {}", e)))?;

    let mut probe = ProbeData::default();

    for stream in &parsed.streams {
        match stream.codec_type.as_deref() {
            Some("video") if probe.frame_rate.is_none() => {
                probe.frame_rate = stream.r_frame_rate.clone();
                probe.video_duration = stream.duration.as_deref().and_then(|d| d.parse().ok());
            }
            Some("audio") if probe.sample_rate.is_none() && probe.channels.is_none() => {
                probe.sample_rate = stream.sample_rate.as_deref().and_then(|r| r.parse().ok());
                probe.channels = stream.channels;
            }
            _ => {}
        }
    }

    probe.container_duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse().ok());

    Ok(probe)
}

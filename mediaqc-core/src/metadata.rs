//! Stream metadata resolution with a single, documented defaulting policy.
//!
//! Analysis parameters come from one probe of the file; every fallback is
//! decided here so the detectors can trust the resolved values:
//!
//! - frame rate absent or malformed -> 25 fps; rational with a zero
//!   denominator -> 0 fps (shot analysis disables itself downstream)
//! - duration absent -> 0 (shot analysis disabled, never guessed)
//! - sample rate absent -> 48000 Hz
//! - channel count absent -> the operator-declared value
//!
//! When the probe reports a channel count that differs from the declared
//! one, the decoded value wins: it is what the audio decode will actually
//! produce.

use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use crate::engine::{MediaEngine, ProbeData};

/// Frame rate assumed when the probe cannot supply one.
pub const DEFAULT_FPS: f64 = 25.0;

/// Sample rate assumed when the probe cannot supply one.
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Resolved analysis parameters for one media file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StreamMetadata {
    /// Frames per second; 0 disables shot-length analysis
    pub fps: f64,
    /// Total duration in seconds; 0 disables shot-length analysis
    pub duration: f64,
    /// Audio sample rate in Hz
    pub sample_rate: u32,
    /// Audio channel count the decode will produce
    pub channels: u32,
}

impl StreamMetadata {
    /// Whether shot-length analysis has the inputs it needs.
    pub fn supports_shot_analysis(&self) -> bool {
        self.fps > 0.0 && self.duration > 0.0
    }
}

/// Probe `path` and resolve metadata, falling back rather than failing.
///
/// A failed probe is a warning, not an abort: the detectors that can still
/// run with defaults do, and the ones that cannot skip themselves.
pub fn resolve(engine: &dyn MediaEngine, path: &Path, declared_channels: u32) -> StreamMetadata {
    let probe = match engine.probe_streams(path) {
        Ok(probe) => probe,
        Err(e) => {
            warn!("Metadata probe failed ({}), continuing with defaults", e);
            ProbeData::default()
        }
    };

    let metadata = from_probe(&probe, declared_channels);
    info!(
        "Resolved metadata: {:.3} fps, {:.2}s, {} Hz, {} channels",
        metadata.fps, metadata.duration, metadata.sample_rate, metadata.channels
    );
    metadata
}

/// Apply the defaulting policy to raw probe output.
pub fn from_probe(probe: &ProbeData, declared_channels: u32) -> StreamMetadata {
    let fps = match probe.frame_rate.as_deref() {
        Some(raw) => match parse_frame_rate(raw) {
            Some(fps) => fps,
            None => {
                warn!("Unparseable frame rate '{}', assuming {} fps", raw, DEFAULT_FPS);
                DEFAULT_FPS
            }
        },
        None => DEFAULT_FPS,
    };

    let duration = probe
        .video_duration
        .or(probe.container_duration)
        .unwrap_or(0.0);
    if duration <= 0.0 {
        warn!("No usable duration in probe output; shot analysis will be skipped");
    }

    let channels = match probe.channels {
        Some(decoded) => {
            if decoded != declared_channels {
                warn!(
                    "Stream has {} audio channels, operator declared {}; using the decoded count",
                    decoded, declared_channels
                );
            }
            decoded
        }
        None => declared_channels,
    };

    StreamMetadata {
        fps,
        duration,
        sample_rate: probe.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
        channels,
    }
}

/// Parse a frame rate that is either rational ("30000/1001") or plain ("25").
///
/// A zero denominator resolves to 0 rather than an error so the shot
/// detector sees the same "no usable rate" signal either way.
fn parse_frame_rate(raw: &str) -> Option<f64> {
    match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                Some(0.0)
            } else {
                Some(num / den)
            }
        }
        None => raw.trim().parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate_rational() {
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_parse_frame_rate_plain_and_invalid() {
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("abc"), None);
        assert_eq!(parse_frame_rate("a/b"), None);
    }

    #[test]
    fn test_parse_frame_rate_zero_denominator() {
        assert_eq!(parse_frame_rate("25/0"), Some(0.0));
    }

    #[test]
    fn test_from_probe_full() {
        let probe = ProbeData {
            frame_rate: Some("25/1".to_string()),
            video_duration: Some(10.0),
            container_duration: Some(10.04),
            sample_rate: Some(44100),
            channels: Some(2),
        };
        let metadata = from_probe(&probe, 8);
        assert_eq!(metadata.fps, 25.0);
        assert_eq!(metadata.duration, 10.0);
        assert_eq!(metadata.sample_rate, 44100);
        // Decoded channel count beats the declared one
        assert_eq!(metadata.channels, 2);
        assert!(metadata.supports_shot_analysis());
    }

    #[test]
    fn test_from_probe_empty_uses_defaults() {
        let metadata = from_probe(&ProbeData::default(), 8);
        assert_eq!(metadata.fps, DEFAULT_FPS);
        assert_eq!(metadata.duration, 0.0);
        assert_eq!(metadata.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(metadata.channels, 8);
        assert!(!metadata.supports_shot_analysis());
    }

    #[test]
    fn test_from_probe_container_duration_fallback() {
        let probe = ProbeData {
            container_duration: Some(42.5),
            ..ProbeData::default()
        };
        let metadata = from_probe(&probe, 2);
        assert_eq!(metadata.duration, 42.5);
    }

    #[test]
    fn test_from_probe_zero_denominator_disables_shots() {
        let probe = ProbeData {
            frame_rate: Some("25/0".to_string()),
            video_duration: Some(10.0),
            ..ProbeData::default()
        };
        let metadata = from_probe(&probe, 2);
        assert_eq!(metadata.fps, 0.0);
        assert!(!metadata.supports_shot_analysis());
    }
}

//! Short-shot detection from scene-cut timestamps.

use std::cmp::Ordering;
use std::path::Path;

use log::{info, warn};

use crate::config::AnalysisConfig;
use crate::engine::{FilterKind, MediaEngine};
use crate::metadata::StreamMetadata;
use crate::report::{DetectorOutcome, Finding};

pub fn detect(
    engine: &dyn MediaEngine,
    path: &Path,
    metadata: &StreamMetadata,
    config: &AnalysisConfig,
) -> DetectorOutcome {
    if metadata.fps <= 0.0 {
        return DetectorOutcome::skipped("frame rate unavailable");
    }
    if metadata.duration <= 0.0 {
        return DetectorOutcome::skipped("duration unavailable");
    }

    let filter = FilterKind::SceneDetect {
        threshold: config.scene_threshold,
    };

    let events = match engine.run_filter(path, &filter) {
        Ok(events) => events,
        Err(e) => {
            warn!("Scene-cut detection failed: {}", e);
            return DetectorOutcome::skipped(format!("scene-cut detection failed: {}", e));
        }
    };

    let mut cut_times: Vec<f64> = events
        .iter()
        .filter_map(|event| event.get("pts_time"))
        .collect();
    cut_times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let findings = short_shots_from_cuts(
        &cut_times,
        metadata.duration,
        metadata.fps,
        config.shot_min_frames,
    );
    info!(
        "Shot detection finished: {} cut(s), {} short shot(s)",
        cut_times.len(),
        findings.len()
    );
    DetectorOutcome::completed(findings)
}

/// Find shots shorter than `min_frames` between consecutive cuts.
///
/// The cut sequence is seeded with 0.0 and closed with the total duration
/// so the first and last shots are measured too. An interval is short iff
/// `0 < duration < min_frames / fps`, strict on both bounds: duplicate
/// timestamps produce zero-length intervals that are not shots, and a
/// shot of exactly the threshold length is acceptable.
fn short_shots_from_cuts(cuts: &[f64], total_duration: f64, fps: f64, min_frames: u32) -> Vec<Finding> {
    let min_duration = f64::from(min_frames) / fps;

    let mut boundaries = Vec::with_capacity(cuts.len() + 2);
    boundaries.push(0.0);
    boundaries.extend_from_slice(cuts);
    boundaries.push(total_duration);

    boundaries
        .windows(2)
        .filter_map(|pair| {
            let duration = pair[1] - pair[0];
            if duration > 0.0 && duration < min_duration {
                Some(Finding::ShortShot {
                    start_seconds: pair[0],
                    duration_frames: duration * fps,
                })
            } else {
                None
            }
        })
        .collect()
}

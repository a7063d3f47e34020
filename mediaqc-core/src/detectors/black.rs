//! Black-interval detection.
//!
//! The engine's black-frame filter runs with zero minimum duration so
//! every black interval is reported, however brief; the operator decides
//! which ones matter.

use std::path::Path;

use log::{info, warn};

use crate::config::AnalysisConfig;
use crate::engine::{DiagnosticEvent, FilterKind, MediaEngine};
use crate::report::{DetectorOutcome, Finding};

pub fn detect(engine: &dyn MediaEngine, path: &Path, config: &AnalysisConfig) -> DetectorOutcome {
    let filter = FilterKind::BlackDetect {
        pixel_threshold: config.black_pixel_threshold,
        picture_threshold: config.black_picture_threshold,
    };

    let events = match engine.run_filter(path, &filter) {
        Ok(events) => events,
        Err(e) => {
            warn!("Black-frame detection failed: {}", e);
            return DetectorOutcome::skipped(format!("black-frame detection failed: {}", e));
        }
    };

    let findings = segments_from_events(&events);
    info!("Black-frame detection finished: {} segment(s)", findings.len());
    DetectorOutcome::completed(findings)
}

/// Map start/end/duration event triples to findings.
///
/// An event missing any of the three fields is ignored.
fn segments_from_events(events: &[DiagnosticEvent]) -> Vec<Finding> {
    events
        .iter()
        .filter_map(|event| {
            Some(Finding::BlackSegment {
                start_seconds: event.get("black_start")?,
                end_seconds: event.get("black_end")?,
                duration_seconds: event.get("black_duration")?,
            })
        })
        .collect()
}

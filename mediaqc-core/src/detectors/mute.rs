//! Prolonged-silence detection, one engine pass per audio channel.
//!
//! Running the silence filter against each extracted channel is slower
//! than one pass over the downmix, but it is the only way to tell the
//! operator which channel went quiet.

use std::path::Path;

use log::{info, warn};

use crate::config::AnalysisConfig;
use crate::engine::{DiagnosticEvent, FilterKind, MediaEngine};
use crate::events::{Event, EventDispatcher};
use crate::report::{Category, DetectorOutcome, Finding};

pub fn detect(
    engine: &dyn MediaEngine,
    path: &Path,
    channels: u32,
    config: &AnalysisConfig,
    events: &EventDispatcher,
) -> DetectorOutcome {
    if channels == 0 {
        return DetectorOutcome::skipped("no audio channels to analyze");
    }

    let mut findings = Vec::new();

    for channel in 0..channels {
        events.emit(Event::ChannelProgress {
            category: Category::Mute,
            channel: channel + 1,
            total: channels,
        });

        let filter = FilterKind::SilenceDetect {
            channel: Some(channel),
            noise_db: config.mute_threshold_db,
            min_duration: config.mute_min_duration,
        };

        let channel_events = match engine.run_filter(path, &filter) {
            Ok(channel_events) => channel_events,
            Err(e) => {
                warn!("Silence detection failed on channel {}: {}", channel + 1, e);
                return DetectorOutcome::skipped(format!(
                    "silence detection failed on channel {}: {}",
                    channel + 1,
                    e
                ));
            }
        };

        findings.extend(segments_from_events(&channel_events, Some(channel)));
    }

    info!(
        "Mute detection finished: {} segment(s) across {} channel(s)",
        findings.len(),
        channels
    );
    DetectorOutcome::completed(findings)
}

/// Map silence-start events to findings for one channel.
fn segments_from_events(events: &[DiagnosticEvent], channel: Option<u32>) -> Vec<Finding> {
    events
        .iter()
        .filter_map(|event| event.get("silence_start"))
        .map(|start_seconds| Finding::MuteSegment {
            channel,
            start_seconds,
        })
        .collect()
}

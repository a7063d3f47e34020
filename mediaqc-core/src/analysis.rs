//! The analysis pipeline: resolver, four detectors, one report.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

use crate::config::AnalysisConfig;
use crate::detectors::{black, mute, peaks, shots};
use crate::engine::MediaEngine;
use crate::error::{QcError, Result};
use crate::events::{Event, EventDispatcher};
use crate::metadata;
use crate::report::{Category, DetectorOutcome, Report};

/// Cooperative cancellation for a running analysis.
///
/// Checked between engine invocations: a cancelled token stops the
/// pipeline before the next detector starts. It does not interrupt an
/// engine subprocess already underway; pair it with
/// [`FfmpegEngine::with_timeout`] to bound those.
///
/// [`FfmpegEngine::with_timeout`]: crate::engine::FfmpegEngine::with_timeout
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any thread, any number of
    /// times.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(QcError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Run the full quality-control analysis of one media file.
///
/// The engine is verified up front (missing tooling is fatal before any
/// detector runs), metadata is resolved with defaults, and the four
/// detectors then execute sequentially. A detector that cannot run or
/// fails mid-flight is reported as skipped; it never aborts the pipeline.
/// Progress is emitted through `events` as the pipeline advances.
///
/// `declared_channels` is the operator's channel count, used only when
/// the probe cannot supply the decoded one.
pub fn run_analysis(
    engine: &dyn MediaEngine,
    input: &Path,
    declared_channels: u32,
    config: &AnalysisConfig,
    events: &EventDispatcher,
    cancel: &CancellationToken,
) -> Result<Report> {
    config.validate()?;

    if !input.exists() {
        return Err(QcError::MediaFile(format!("File not found: {:?}", input)));
    }

    engine.verify()?;
    cancel.checkpoint()?;

    info!("Starting analysis of {:?}", input);
    events.emit(Event::AnalysisStarted {
        input: input.display().to_string(),
    });

    let meta = metadata::resolve(engine, input, declared_channels);
    events.emit(Event::MetadataResolved {
        fps: meta.fps,
        duration: meta.duration,
        sample_rate: meta.sample_rate,
        channels: meta.channels,
    });
    if !meta.supports_shot_analysis() {
        events.emit(Event::Warning {
            message: "frame rate or duration unavailable; shot analysis will be skipped"
                .to_string(),
        });
    }

    cancel.checkpoint()?;
    events.emit(Event::DetectorStarted {
        category: Category::Mute,
        step: 1,
        total: 4,
    });
    let mute_outcome = mute::detect(engine, input, meta.channels, config, events);
    emit_outcome(events, Category::Mute, &mute_outcome);

    cancel.checkpoint()?;
    events.emit(Event::DetectorStarted {
        category: Category::ShortShots,
        step: 2,
        total: 4,
    });
    let shots_outcome = shots::detect(engine, input, &meta, config);
    emit_outcome(events, Category::ShortShots, &shots_outcome);

    cancel.checkpoint()?;
    events.emit(Event::DetectorStarted {
        category: Category::AudioPeaks,
        step: 3,
        total: 4,
    });
    let peaks_outcome = peaks::detect(engine, input, &meta, config, events);
    emit_outcome(events, Category::AudioPeaks, &peaks_outcome);

    cancel.checkpoint()?;
    events.emit(Event::DetectorStarted {
        category: Category::BlackFrames,
        step: 4,
        total: 4,
    });
    let black_outcome = black::detect(engine, input, config);
    emit_outcome(events, Category::BlackFrames, &black_outcome);

    let report = Report::assemble(
        input.to_path_buf(),
        mute_outcome,
        shots_outcome,
        peaks_outcome,
        black_outcome,
    );

    info!(
        "Analysis finished: {} finding(s) across {} detector(s)",
        report.finding_count(),
        report.detectors.len()
    );
    events.emit(Event::AnalysisComplete {
        total_findings: report.finding_count(),
    });

    Ok(report)
}

fn emit_outcome(events: &EventDispatcher, category: Category, outcome: &DetectorOutcome) {
    match outcome {
        DetectorOutcome::Completed { findings } => events.emit(Event::DetectorCompleted {
            category,
            findings: findings.len(),
        }),
        DetectorOutcome::Skipped { reason } => events.emit(Event::DetectorSkipped {
            category,
            reason: reason.clone(),
        }),
    }
}

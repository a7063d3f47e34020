//! Short audio-peak detection over decoded PCM.
//!
//! The only detector that analyzes sample data instead of filter
//! diagnostics: the whole stream is decoded to interleaved f32 at the
//! resolved sample rate and scanned per channel for brief excursions
//! above the threshold. Memory use is the full decode,
//! `duration * sample_rate * channels * 4` bytes.

use std::path::Path;

use log::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::engine::MediaEngine;
use crate::events::{Event, EventDispatcher};
use crate::metadata::StreamMetadata;
use crate::report::{Category, DetectorOutcome, Finding};

pub fn detect(
    engine: &dyn MediaEngine,
    path: &Path,
    metadata: &StreamMetadata,
    config: &AnalysisConfig,
    events: &EventDispatcher,
) -> DetectorOutcome {
    if metadata.channels == 0 {
        return DetectorOutcome::skipped("no audio channels to analyze");
    }
    if metadata.sample_rate == 0 {
        return DetectorOutcome::skipped("sample rate unavailable");
    }

    let samples = match engine.decode_audio(path, metadata.sample_rate) {
        Ok(samples) => samples,
        Err(e) => {
            warn!("Audio decode failed: {}", e);
            return DetectorOutcome::skipped(format!("audio decode failed: {}", e));
        }
    };

    let outcome = scan_interleaved(
        &samples,
        metadata.channels,
        metadata.sample_rate,
        config,
        events,
    );
    if let DetectorOutcome::Completed { findings } = &outcome {
        info!(
            "Peak detection finished: {} peak(s) in {} samples",
            findings.len(),
            samples.len()
        );
    }
    outcome
}

/// Convert a dBFS threshold to a linear amplitude ratio.
pub(crate) fn linear_threshold(dbfs: f64) -> f64 {
    10f64.powf(dbfs / 20.0)
}

/// Scan interleaved samples for short above-threshold runs per channel.
///
/// The decoded stream must divide evenly into the channel count; a
/// remainder means the stream disagrees with the declared layout and the
/// scan refuses to guess at a reshape.
fn scan_interleaved(
    samples: &[f32],
    channels: u32,
    sample_rate: u32,
    config: &AnalysisConfig,
    events: &EventDispatcher,
) -> DetectorOutcome {
    let channel_count = channels as usize;
    if samples.len() % channel_count != 0 {
        warn!(
            "Decoded {} samples do not divide into {} channels; skipping peak analysis",
            samples.len(),
            channel_count
        );
        return DetectorOutcome::skipped(format!(
            "decoded sample count {} does not match {} channels",
            samples.len(),
            channel_count
        ));
    }

    let linear = linear_threshold(config.peak_threshold_dbfs);
    let rate = f64::from(sample_rate);
    let mut findings = Vec::new();

    for channel in 0..channel_count {
        events.emit(Event::ChannelProgress {
            category: Category::AudioPeaks,
            channel: channel as u32 + 1,
            total: channels,
        });

        let mask: Vec<bool> = samples
            .iter()
            .skip(channel)
            .step_by(channel_count)
            .map(|s| f64::from(s.abs()) > linear)
            .collect();

        if !mask.iter().any(|&above| above) {
            continue;
        }

        let runs = find_runs(&mask);
        debug!("Channel {}: {} above-threshold run(s)", channel + 1, runs.len());

        for (start, end) in runs {
            let duration = (end - start) as f64 / rate;
            // Runs at or past the limit are sustained loud audio, not peaks
            if duration > 0.0 && duration < config.peak_max_duration {
                findings.push(Finding::AudioPeak {
                    channel: channel as u32,
                    start_seconds: start as f64 / rate,
                });
            }
        }
    }

    DetectorOutcome::completed(findings)
}

/// All maximal `true` runs in a mask as half-open `(start, end)` ranges.
///
/// Equivalent to padding the mask with `false` on both ends and taking
/// the first difference: a false->true transition starts a run, a
/// true->false transition ends one. Single linear pass.
fn find_runs(mask: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut previous = false;
    let mut start = 0;

    for (index, &current) in mask.iter().enumerate() {
        if current && !previous {
            start = index;
        }
        if !current && previous {
            runs.push((start, index));
        }
        previous = current;
    }

    if previous {
        runs.push((start, mask.len()));
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    fn scan(samples: &[f32], channels: u32, sample_rate: u32, config: &AnalysisConfig) -> DetectorOutcome {
        scan_interleaved(samples, channels, sample_rate, config, &EventDispatcher::new())
    }

    /// Mono samples with the given index ranges pushed above full scale.
    fn samples_with_runs(len: usize, runs: &[(usize, usize)]) -> Vec<f32> {
        let mut samples = vec![0.0f32; len];
        for &(start, end) in runs {
            for sample in &mut samples[start..end] {
                *sample = 0.999;
            }
        }
        samples
    }

    #[test]
    fn test_linear_threshold() {
        assert!((linear_threshold(0.0) - 1.0).abs() < 1e-12);
        assert!((linear_threshold(-6.0) - 0.501187).abs() < 1e-6);
        assert!((linear_threshold(-1.5) - 0.841395).abs() < 1e-6);
    }

    #[test]
    fn test_find_runs_interior() {
        let mask = [false, true, true, false, true, false];
        assert_eq!(find_runs(&mask), vec![(1, 3), (4, 5)]);
    }

    #[test]
    fn test_find_runs_at_edges() {
        let mask = [true, true, false, false, true];
        assert_eq!(find_runs(&mask), vec![(0, 2), (4, 5)]);
    }

    #[test]
    fn test_find_runs_all_true_and_empty() {
        assert_eq!(find_runs(&[true; 4]), vec![(0, 4)]);
        assert_eq!(find_runs(&[]), Vec::<(usize, usize)>::new());
        assert_eq!(find_runs(&[false; 4]), Vec::<(usize, usize)>::new());
    }

    #[test]
    fn test_reference_scenario_mono_48k() {
        // Amplitude above threshold exactly on [1000, 1048): one ~1ms peak
        let samples = samples_with_runs(48000, &[(1000, 1048)]);
        let outcome = scan(&samples, 1, 48000, &test_config());

        match outcome {
            DetectorOutcome::Completed { findings } => {
                assert_eq!(findings.len(), 1);
                match &findings[0] {
                    Finding::AudioPeak {
                        channel,
                        start_seconds,
                    } => {
                        assert_eq!(*channel, 0);
                        assert!((start_seconds - 1000.0 / 48000.0).abs() < 1e-12);
                    }
                    other => panic!("unexpected finding {:?}", other),
                }
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_run_at_max_duration_is_not_a_peak() {
        // 0.2s at 48 kHz is 9600 samples: exactly at the limit, not short
        let samples = samples_with_runs(48000, &[(0, 9600)]);
        let outcome = scan(&samples, 1, 48000, &test_config());
        assert_eq!(outcome.findings().len(), 0);

        // One sample fewer is strictly below the limit
        let samples = samples_with_runs(48000, &[(0, 9599)]);
        let outcome = scan(&samples, 1, 48000, &test_config());
        assert_eq!(outcome.findings().len(), 1);
    }

    #[test]
    fn test_sustained_loud_audio_is_ignored_next_to_peaks() {
        let samples = samples_with_runs(96000, &[(100, 120), (20000, 40000)]);
        let outcome = scan(&samples, 1, 48000, &test_config());
        let findings = outcome.findings();
        assert_eq!(findings.len(), 1);
        assert!((findings[0].start_seconds() - 100.0 / 48000.0).abs() < 1e-12);
    }

    #[test]
    fn test_channels_are_scanned_independently() {
        // Stereo interleave: peak only on the right channel, frames 500..520
        let mut samples = vec![0.0f32; 2 * 48000];
        for frame in 500..520 {
            samples[frame * 2 + 1] = 0.95;
        }

        let outcome = scan(&samples, 2, 48000, &test_config());
        let findings = outcome.findings();
        assert_eq!(findings.len(), 1);
        match &findings[0] {
            Finding::AudioPeak {
                channel,
                start_seconds,
            } => {
                assert_eq!(*channel, 1);
                assert!((start_seconds - 500.0 / 48000.0).abs() < 1e-12);
            }
            other => panic!("unexpected finding {:?}", other),
        }
    }

    #[test]
    fn test_multiple_ranges_reported_in_ascending_order() {
        let samples = samples_with_runs(48000, &[(100, 110), (2000, 2010), (9000, 9003)]);
        let outcome = scan(&samples, 1, 48000, &test_config());
        let starts: Vec<f64> = outcome
            .findings()
            .iter()
            .map(|f| f.start_seconds())
            .collect();
        assert_eq!(
            starts,
            vec![100.0 / 48000.0, 2000.0 / 48000.0, 9000.0 / 48000.0]
        );
    }

    #[test]
    fn test_channel_mismatch_is_skipped() {
        // 7 samples cannot be 2 interleaved channels
        let samples = vec![0.0f32; 7];
        let outcome = scan(&samples, 2, 48000, &test_config());
        assert!(matches!(outcome, DetectorOutcome::Skipped { .. }));
    }

    #[test]
    fn test_quiet_channel_produces_nothing() {
        let samples = vec![0.1f32; 4800];
        let outcome = scan(&samples, 1, 48000, &test_config());
        assert_eq!(outcome.findings().len(), 0);
        assert!(matches!(outcome, DetectorOutcome::Completed { .. }));
    }

    #[test]
    fn test_amplitude_comparison_is_strict() {
        // At 0 dBFS the linear threshold is exactly 1.0; samples sitting
        // exactly on it must not trip the mask
        let mut config = test_config();
        config.peak_threshold_dbfs = 0.0;
        let samples = vec![1.0f32; 480];
        let outcome = scan(&samples, 1, 48000, &config);
        assert_eq!(outcome.findings().len(), 0);
    }
}

//! Findings and the aggregated analysis report.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Detector categories in their fixed report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Mute,
    ShortShots,
    AudioPeaks,
    BlackFrames,
}

impl Category {
    /// Report order: mute, shots, peaks, black.
    pub const ORDER: [Category; 4] = [
        Category::Mute,
        Category::ShortShots,
        Category::AudioPeaks,
        Category::BlackFrames,
    ];
}

impl Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Mute => write!(f, "Prolonged mute"),
            Category::ShortShots => write!(f, "Short shots"),
            Category::AudioPeaks => write!(f, "Audio peaks"),
            Category::BlackFrames => write!(f, "Black frames"),
        }
    }
}

/// A single detected problem, one variant per detector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    MuteSegment {
        /// 0-based channel index; None when detection ran across all channels
        channel: Option<u32>,
        start_seconds: f64,
    },
    ShortShot {
        start_seconds: f64,
        duration_frames: f64,
    },
    AudioPeak {
        /// 0-based channel index
        channel: u32,
        start_seconds: f64,
    },
    BlackSegment {
        start_seconds: f64,
        end_seconds: f64,
        duration_seconds: f64,
    },
}

impl Finding {
    /// Where in the timeline this finding begins.
    pub fn start_seconds(&self) -> f64 {
        match self {
            Finding::MuteSegment { start_seconds, .. }
            | Finding::ShortShot { start_seconds, .. }
            | Finding::AudioPeak { start_seconds, .. }
            | Finding::BlackSegment { start_seconds, .. } => *start_seconds,
        }
    }

    /// The category this finding reports under.
    pub fn category(&self) -> Category {
        match self {
            Finding::MuteSegment { .. } => Category::Mute,
            Finding::ShortShot { .. } => Category::ShortShots,
            Finding::AudioPeak { .. } => Category::AudioPeaks,
            Finding::BlackSegment { .. } => Category::BlackFrames,
        }
    }
}

impl Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MuteSegment {
                channel: Some(c),
                start_seconds,
            } => write!(f, "channel {}: mute from {:.2}s", c + 1, start_seconds),
            Finding::MuteSegment {
                channel: None,
                start_seconds,
            } => write!(f, "mute from {:.2}s", start_seconds),
            Finding::ShortShot {
                start_seconds,
                duration_frames,
            } => write!(
                f,
                "shot at {:.2}s lasts only ~{:.1} frames",
                start_seconds, duration_frames
            ),
            Finding::AudioPeak {
                channel,
                start_seconds,
            } => write!(f, "channel {}: peak at {:.2}s", channel + 1, start_seconds),
            Finding::BlackSegment {
                start_seconds,
                end_seconds,
                duration_seconds,
            } => write!(
                f,
                "black from {:.2}s to {:.2}s ({:.2}s)",
                start_seconds, end_seconds, duration_seconds
            ),
        }
    }
}

/// What a detector produced: findings, or the reason it could not run.
///
/// A detector that ran and found nothing is `Completed` with an empty
/// list, which is not the same thing as `Skipped`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectorOutcome {
    Completed { findings: Vec<Finding> },
    Skipped { reason: String },
}

impl DetectorOutcome {
    pub fn completed(findings: Vec<Finding>) -> Self {
        DetectorOutcome::Completed { findings }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        DetectorOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn findings(&self) -> &[Finding] {
        match self {
            DetectorOutcome::Completed { findings } => findings,
            DetectorOutcome::Skipped { .. } => &[],
        }
    }
}

/// One detector's entry in the report.
#[derive(Debug, Clone, Serialize)]
pub struct DetectorReport {
    pub category: Category,
    pub outcome: DetectorOutcome,
}

/// The aggregated analysis report handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// The analyzed file
    pub input: PathBuf,
    /// When the analysis finished
    pub generated_at: DateTime<Local>,
    /// Detector results in fixed category order
    pub detectors: Vec<DetectorReport>,
}

impl Report {
    /// Assemble the report in fixed category order, sorting each completed
    /// detector's findings chronologically.
    pub fn assemble(
        input: PathBuf,
        mute: DetectorOutcome,
        shots: DetectorOutcome,
        peaks: DetectorOutcome,
        black: DetectorOutcome,
    ) -> Self {
        let detectors = Category::ORDER
            .into_iter()
            .zip([mute, shots, peaks, black])
            .map(|(category, outcome)| DetectorReport {
                category,
                outcome: sort_outcome(outcome),
            })
            .collect();

        Self {
            input,
            generated_at: Local::now(),
            detectors,
        }
    }

    /// All findings across categories, in report order.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.detectors
            .iter()
            .flat_map(|d| d.outcome.findings().iter())
    }

    /// Total number of findings.
    pub fn finding_count(&self) -> usize {
        self.findings().count()
    }

    /// Whether any detector had to be skipped.
    pub fn has_skipped(&self) -> bool {
        self.detectors
            .iter()
            .any(|d| matches!(d.outcome, DetectorOutcome::Skipped { .. }))
    }
}

fn sort_outcome(outcome: DetectorOutcome) -> DetectorOutcome {
    match outcome {
        DetectorOutcome::Completed { mut findings } => {
            findings.sort_by(|a, b| {
                a.start_seconds()
                    .partial_cmp(&b.start_seconds())
                    .unwrap_or(Ordering::Equal)
            });
            DetectorOutcome::Completed { findings }
        }
        skipped => skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_keeps_category_order() {
        let report = Report::assemble(
            PathBuf::from("clip.mxf"),
            DetectorOutcome::completed(vec![]),
            DetectorOutcome::skipped("no frame rate"),
            DetectorOutcome::completed(vec![]),
            DetectorOutcome::completed(vec![]),
        );

        let categories: Vec<Category> = report.detectors.iter().map(|d| d.category).collect();
        assert_eq!(categories, Category::ORDER.to_vec());
        assert!(report.has_skipped());
        assert_eq!(report.finding_count(), 0);
    }

    #[test]
    fn test_assemble_sorts_findings_chronologically() {
        let report = Report::assemble(
            PathBuf::from("clip.mxf"),
            DetectorOutcome::completed(vec![
                Finding::MuteSegment {
                    channel: Some(1),
                    start_seconds: 9.0,
                },
                Finding::MuteSegment {
                    channel: Some(0),
                    start_seconds: 2.5,
                },
            ]),
            DetectorOutcome::completed(vec![]),
            DetectorOutcome::completed(vec![
                Finding::AudioPeak {
                    channel: 0,
                    start_seconds: 8.0,
                },
                Finding::AudioPeak {
                    channel: 1,
                    start_seconds: 1.0,
                },
            ]),
            DetectorOutcome::completed(vec![]),
        );

        let starts: Vec<f64> = report.findings().map(|f| f.start_seconds()).collect();
        assert_eq!(starts, vec![2.5, 9.0, 1.0, 8.0]);
    }

    #[test]
    fn test_finding_accessors() {
        let finding = Finding::BlackSegment {
            start_seconds: 1.0,
            end_seconds: 3.0,
            duration_seconds: 2.0,
        };
        assert_eq!(finding.start_seconds(), 1.0);
        assert_eq!(finding.category(), Category::BlackFrames);
    }

    #[test]
    fn test_report_serializes_with_tags() {
        let report = Report::assemble(
            PathBuf::from("clip.mxf"),
            DetectorOutcome::completed(vec![Finding::MuteSegment {
                channel: Some(0),
                start_seconds: 1.25,
            }]),
            DetectorOutcome::skipped("duration unavailable"),
            DetectorOutcome::completed(vec![]),
            DetectorOutcome::completed(vec![]),
        );

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"kind\":\"mute_segment\""));
        assert!(json.contains("\"status\":\"skipped\""));
        assert!(json.contains("\"reason\":\"duration unavailable\""));
    }
}

//! Terminal presentation: live progress events and the final report.

use console::style;

use mediaqc_core::{Category, DetectorOutcome, Event, EventHandler, Report};

/// Prints pipeline progress as it happens, in the order the operator is
/// used to reading it.
pub struct TerminalEventHandler;

impl EventHandler for TerminalEventHandler {
    fn handle(&self, event: &Event) {
        match event {
            Event::AnalysisStarted { input } => {
                println!("Analyzing {}", style(input).bold());
                println!("{}", "-".repeat(50));
            }
            Event::MetadataResolved {
                fps,
                duration,
                sample_rate,
                channels,
            } => {
                println!(
                    "Metadata: {:.2}s, {:.3} fps, {} Hz, {} channel(s)",
                    duration, fps, sample_rate, channels
                );
            }
            Event::DetectorStarted {
                category,
                step,
                total,
            } => {
                println!("\n[{}/{}] {}...", step, total, category);
            }
            Event::ChannelProgress {
                category: _,
                channel,
                total,
            } => {
                println!("    channel {}/{}...", channel, total);
            }
            Event::DetectorSkipped { category: _, reason } => {
                println!("    {} {}", style("skipped:").yellow(), reason);
            }
            Event::DetectorCompleted {
                category: _,
                findings: 0,
            } => {
                println!("    {} no issues found", style("ok:").green());
            }
            Event::DetectorCompleted {
                category: _,
                findings,
            } => {
                println!(
                    "    {} {} issue(s) found",
                    style("found:").red(),
                    findings
                );
            }
            Event::Warning { message } => {
                println!("    {} {}", style("warning:").yellow(), message);
            }
            Event::AnalysisComplete { total_findings } => {
                println!("{}", "-".repeat(50));
                println!(
                    "Analysis complete: {} finding(s) total",
                    style(total_findings).bold()
                );
            }
        }
    }
}

/// Render the aggregated report, category by category.
pub fn render_report(report: &Report) {
    println!("\n{}", style("QUALITY CONTROL REPORT").bold());
    println!("File: {}", report.input.display());
    println!(
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    for detector in &report.detectors {
        println!("\n{}", style(detector.category).bold().underlined());
        match &detector.outcome {
            DetectorOutcome::Skipped { reason } => {
                println!("  {} {}", style("skipped:").yellow(), reason);
            }
            DetectorOutcome::Completed { findings } if findings.is_empty() => {
                println!("  {}", style("no issues found").green());
            }
            DetectorOutcome::Completed { findings } => {
                for finding in findings {
                    println!("  {} {}", marker_for(detector.category), finding);
                }
            }
        }
    }

    println!(
        "\n{} finding(s) total{}",
        style(report.finding_count()).bold(),
        if report.has_skipped() {
            " (some detectors were skipped)"
        } else {
            ""
        }
    );
}

fn marker_for(category: Category) -> console::StyledObject<&'static str> {
    match category {
        Category::Mute => style("-").cyan(),
        Category::ShortShots => style("-").magenta(),
        Category::AudioPeaks => style("-").red(),
        Category::BlackFrames => style("-").blue(),
    }
}

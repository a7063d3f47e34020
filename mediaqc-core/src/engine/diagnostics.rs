//! Extraction of typed events from free-form filter diagnostics.
//!
//! The media engine reports filter findings as human-oriented log lines on
//! stderr. Everything that knows about that phrasing lives here: each
//! filter gets a [`LineScanner`] holding the marker string and the field
//! regexes for its line format, and the detectors only ever see
//! [`DiagnosticEvent`] values. Lines that do not match are ignored, they
//! are not an error.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static SILENCE_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"silence_start:\s*(-?[\d\.]+)").unwrap());

static PTS_TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"pts_time:([\d\.]+)").unwrap());

static BLACK_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"black_start:([\d\.]+)").unwrap());

static BLACK_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"black_end:([\d\.]+)").unwrap());

static BLACK_DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"black_duration:([\d\.]+)").unwrap());

/// One typed event extracted from a matched diagnostic line: a mapping
/// from field name to numeric value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticEvent {
    fields: HashMap<&'static str, f64>,
}

impl DiagnosticEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: f64) {
        self.fields.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }
}

/// A reusable line-oriented scanner for one filter's diagnostic format.
///
/// A line is considered at all only if it contains `marker`; it then has
/// to yield every configured field to produce an event. Lines missing any
/// field are discarded.
pub struct LineScanner {
    marker: &'static str,
    fields: Vec<(&'static str, &'static Regex)>,
}

impl LineScanner {
    pub fn new(marker: &'static str, fields: Vec<(&'static str, &'static Regex)>) -> Self {
        Self { marker, fields }
    }

    /// Scan diagnostic text and return one event per fully matched line.
    pub fn scan(&self, text: &str) -> Vec<DiagnosticEvent> {
        let mut events = Vec::new();

        for line in text.lines() {
            if !line.contains(self.marker) {
                continue;
            }

            let mut event = DiagnosticEvent::new();
            let mut complete = true;

            for (name, regex) in &self.fields {
                let value = regex
                    .captures(line)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse::<f64>().ok());

                match value {
                    Some(v) => event.insert(name, v),
                    None => {
                        complete = false;
                        break;
                    }
                }
            }

            if complete {
                events.push(event);
            }
        }

        events
    }
}

/// Scanner for `silencedetect` output lines.
///
/// Only the start marker is consumed; the report does not correlate
/// silence ends.
pub fn silence_scanner() -> LineScanner {
    LineScanner::new("silence_start", vec![("silence_start", &*SILENCE_START_RE)])
}

/// Scanner for scene-cut frame timestamps (`showinfo` output for frames
/// selected by the scene filter).
pub fn scene_scanner() -> LineScanner {
    LineScanner::new("pts_time", vec![("pts_time", &*PTS_TIME_RE)])
}

/// Scanner for `blackdetect` interval lines.
pub fn black_scanner() -> LineScanner {
    LineScanner::new(
        "black_start",
        vec![
            ("black_start", &*BLACK_START_RE),
            ("black_end", &*BLACK_END_RE),
            ("black_duration", &*BLACK_DURATION_RE),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_scanner_extracts_starts() {
        let stderr = "\
[silencedetect @ 0x5591] silence_start: 4.36462
frame= 1000 fps=25 q=-0.0 size=N/A time=00:00:40.00 bitrate=N/A speed= 100x
[silencedetect @ 0x5591] silence_end: 7.5 | silence_duration: 3.13538
[silencedetect @ 0x5591] silence_start: 12.25";

        let events = silence_scanner().scan(stderr);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].get("silence_start"), Some(4.36462));
        assert_eq!(events[1].get("silence_start"), Some(12.25));
    }

    #[test]
    fn test_scene_scanner_extracts_timestamps() {
        let stderr = "\
[Parsed_showinfo_1 @ 0x55d1] n:   0 pts:  48048 pts_time:2.002 duration:2002
[Parsed_showinfo_1 @ 0x55d1] color_range:tv color_spaces:bt709
[Parsed_showinfo_1 @ 0x55d1] n:   1 pts:  50928 pts_time:2.122 duration:2002";

        let events = scene_scanner().scan(stderr);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].get("pts_time"), Some(2.002));
        assert_eq!(events[1].get("pts_time"), Some(2.122));
    }

    #[test]
    fn test_black_scanner_requires_all_three_fields() {
        let stderr = "\
[blackdetect @ 0x560a] black_start:0 black_end:2.00833 black_duration:2.00833
[blackdetect @ 0x560a] black_start:10.5 black_end:11.2
[blackdetect @ 0x560a] black_start:30 black_end:31 black_duration:1";

        let events = black_scanner().scan(stderr);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].get("black_start"), Some(0.0));
        assert_eq!(events[0].get("black_end"), Some(2.00833));
        assert_eq!(events[0].get("black_duration"), Some(2.00833));
        assert_eq!(events[1].get("black_start"), Some(30.0));
    }

    #[test]
    fn test_unmatched_lines_are_ignored() {
        let stderr = "Input #0, mov,mp4,m4a, from 'clip.mov':\n  Duration: 00:01:00.00";
        assert!(silence_scanner().scan(stderr).is_empty());
        assert!(scene_scanner().scan(stderr).is_empty());
        assert!(black_scanner().scan(stderr).is_empty());
    }
}

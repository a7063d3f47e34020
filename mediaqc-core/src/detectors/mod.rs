//! The four defect detectors.
//!
//! Each detector is a free function taking the engine, the file, its
//! inputs, and the configuration, and returning a [`DetectorOutcome`]:
//! findings on success, or a skip reason when it could not run. Detector
//! failures never escape as errors; the pipeline keeps going.
//!
//! [`DetectorOutcome`]: crate::report::DetectorOutcome

pub mod black;
pub mod mute;
pub mod peaks;
pub mod shots;

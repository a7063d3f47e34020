use serde::{Deserialize, Serialize};

/// Detection thresholds for a quality-control analysis run.
///
/// Every knob the four detectors consult lives here; nothing is read from
/// globals. Defaults match the values the QC operators have been running
/// with in production.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Silence level in dB below which audio counts as mute
    #[serde(default = "default_mute_threshold_db")]
    pub mute_threshold_db: f64,

    /// Minimum silence duration in seconds before a mute segment is reported
    #[serde(default = "default_mute_min_duration")]
    pub mute_min_duration: f64,

    /// Shots shorter than this many frames are flagged
    #[serde(default = "default_shot_min_frames")]
    pub shot_min_frames: u32,

    /// Scene-cut detection sensitivity (0.0-1.0)
    #[serde(default = "default_scene_threshold")]
    pub scene_threshold: f64,

    /// Peak amplitude threshold in dBFS (0 is full scale)
    #[serde(default = "default_peak_threshold_dbfs")]
    pub peak_threshold_dbfs: f64,

    /// Maximum duration in seconds for a loud run to count as a short peak
    #[serde(default = "default_peak_max_duration")]
    pub peak_max_duration: f64,

    /// Fraction of dark pixels for a frame to count as black (0.0-1.0)
    #[serde(default = "default_black_pixel_threshold")]
    pub black_pixel_threshold: f64,

    /// Picture-level darkness threshold for blackdetect (0.0-1.0)
    #[serde(default = "default_black_picture_threshold")]
    pub black_picture_threshold: f64,
}

fn default_mute_threshold_db() -> f64 {
    -50.0
}

fn default_mute_min_duration() -> f64 {
    1.0
}

fn default_shot_min_frames() -> u32 {
    5
}

fn default_scene_threshold() -> f64 {
    0.4
}

fn default_peak_threshold_dbfs() -> f64 {
    -1.5
}

fn default_peak_max_duration() -> f64 {
    0.2
}

fn default_black_pixel_threshold() -> f64 {
    0.98
}

fn default_black_picture_threshold() -> f64 {
    0.99
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mute_threshold_db: default_mute_threshold_db(),
            mute_min_duration: default_mute_min_duration(),
            shot_min_frames: default_shot_min_frames(),
            scene_threshold: default_scene_threshold(),
            peak_threshold_dbfs: default_peak_threshold_dbfs(),
            peak_max_duration: default_peak_max_duration(),
            black_pixel_threshold: default_black_pixel_threshold(),
            black_picture_threshold: default_black_picture_threshold(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.mute_min_duration <= 0.0 {
            return Err(crate::error::QcError::Config(format!(
                "Mute minimum duration must be positive, got {}",
                self.mute_min_duration
            )));
        }

        if self.shot_min_frames == 0 {
            return Err(crate::error::QcError::Config(
                "Shot frame threshold must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.scene_threshold) {
            return Err(crate::error::QcError::Config(format!(
                "Scene threshold must be between 0 and 1, got {}",
                self.scene_threshold
            )));
        }

        if self.peak_threshold_dbfs > 0.0 {
            return Err(crate::error::QcError::Config(format!(
                "Peak threshold is relative to full scale and cannot exceed 0 dBFS, got {}",
                self.peak_threshold_dbfs
            )));
        }

        if self.peak_max_duration <= 0.0 {
            return Err(crate::error::QcError::Config(format!(
                "Peak maximum duration must be positive, got {}",
                self.peak_max_duration
            )));
        }

        for (name, value) in [
            ("Black pixel threshold", self.black_pixel_threshold),
            ("Black picture threshold", self.black_picture_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(crate::error::QcError::Config(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.mute_threshold_db, -50.0);
        assert_eq!(config.mute_min_duration, 1.0);
        assert_eq!(config.shot_min_frames, 5);
        assert_eq!(config.scene_threshold, 0.4);
        assert_eq!(config.peak_threshold_dbfs, -1.5);
        assert_eq!(config.peak_max_duration, 0.2);
        assert_eq!(config.black_pixel_threshold, 0.98);
        assert_eq!(config.black_picture_threshold, 0.99);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.shot_min_frames, 5);
        assert_eq!(config.peak_threshold_dbfs, -1.5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.shot_min_frames = 0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.peak_threshold_dbfs = 3.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.black_pixel_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.mute_min_duration = 0.0;
        assert!(config.validate().is_err());
    }
}

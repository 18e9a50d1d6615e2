//! Run configuration.
//!
//! Configuration is loaded once at startup, validated before any frame
//! is read, and passed by reference into each entry point. Nothing in
//! the library mutates it afterwards.

use crate::analysis::{Rect, SignalKind};
use crate::timing::SampleMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration validation errors.
///
/// Arithmetic edge cases (zero rates, empty image sets, impossible
/// frequencies) are reported here rather than surfacing as NaN or
/// division faults further down.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A rate was zero, negative or not finite.
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidRate {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Clip duration was zero, negative or not finite.
    #[error("clip duration must be a positive finite number of seconds, got {0}")]
    InvalidDuration(f64),
    /// No stimulus images.
    #[error("no stimulus images supplied")]
    NoStimuli,
    /// Fewer refresh frames than stimuli.
    #[error("{stimulus_count} stimuli cannot share {total_frames} refresh frames")]
    TooManyStimuli {
        /// Number of stimuli requested.
        stimulus_count: usize,
        /// Refresh frames in the whole clip.
        total_frames: f64,
    },
    /// A half-cycle would be shorter than one refresh frame.
    #[error(
        "requested frequency {requested} Hz is too high for a {refresh_rate} Hz display \
         and {stimulus_duration:.3}s per stimulus"
    )]
    FrequencyTooHigh {
        /// Requested flicker frequency in Hz.
        requested: f64,
        /// Display refresh rate in Hz.
        refresh_rate: f64,
        /// Seconds per stimulus.
        stimulus_duration: f64,
    },
    /// Motion threshold was negative or not finite.
    #[error("motion threshold must be a finite value >= 0, got {0}")]
    InvalidThreshold(f64),
    /// Screen width or height was zero.
    #[error("invalid screen dimensions {width}x{height}")]
    InvalidDimensions {
        /// Screen width.
        width: u32,
        /// Screen height.
        height: u32,
    },
    /// An exclusion rectangle had no area.
    #[error("exclusion region {0:?} has zero area")]
    EmptyExclusion(Rect),
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Checks that a rate-like quantity is finite and strictly positive.
pub(crate) fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidRate { name, value })
    }
}

/// Stimulus generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Desired flicker frequency in Hz.
    pub requested_frequency: f64,
    /// Display refresh rate in Hz.
    pub refresh_rate: f64,
    /// Clip duration in seconds, shared evenly between stimuli.
    pub duration: f64,
    /// Output canvas width in pixels.
    pub screen_width: u32,
    /// Output canvas height in pixels.
    pub screen_height: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            requested_frequency: 1.5,
            refresh_rate: 144.0,
            duration: 15.0,
            screen_width: 1920,
            screen_height: 1080,
        }
    }
}

impl GenerationConfig {
    /// Validates the generation parameters.
    ///
    /// The stimulus count is only known once images are supplied, so the
    /// frequency/refresh compatibility check happens in the quantizer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("requested_frequency", self.requested_frequency)?;
        positive("refresh_rate", self.refresh_rate)?;
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(ConfigError::InvalidDuration(self.duration));
        }
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(ConfigError::InvalidDimensions {
                width: self.screen_width,
                height: self.screen_height,
            });
        }
        Ok(())
    }
}

/// Luminance/motion extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Leading frames to drop (wait screens and the like).
    pub skip_starting_frames: u64,
    /// Resample onto `sampling_rate` instead of emitting one value per frame.
    pub run_over_time: bool,
    /// Rate of the external stream to align with, in Hz.
    pub sampling_rate: u32,
    /// Per-pixel differences below this (0-255 scale) count as noise.
    pub motion_threshold: f64,
    /// Native rate reported for image-sequence sources.
    pub source_frame_rate: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            skip_starting_frames: 0,
            run_over_time: true,
            sampling_rate: 1000,
            motion_threshold: 10.0,
            source_frame_rate: 30.0,
        }
    }
}

impl AnalysisConfig {
    /// Validates the analysis parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run_over_time {
            positive("sampling_rate", f64::from(self.sampling_rate))?;
        }
        if !(self.motion_threshold.is_finite() && self.motion_threshold >= 0.0) {
            return Err(ConfigError::InvalidThreshold(self.motion_threshold));
        }
        positive("source_frame_rate", self.source_frame_rate)?;
        Ok(())
    }

    /// How samples are emitted per analysed frame.
    pub fn sample_mode(&self) -> SampleMode {
        if self.run_over_time {
            SampleMode::OverTime {
                target_rate: f64::from(self.sampling_rate),
            }
        } else {
            SampleMode::PerFrame
        }
    }
}

/// Rectangles for each supported recording resolution.
///
/// Rectangles are `(x, y, w, h)` in pixels and are typically used to
/// hide a picture-in-picture overlay. A resolution left out of a TOML
/// table gets no regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSet {
    /// Regions for 1920x1080 recordings.
    #[serde(default)]
    pub hd: Vec<Rect>,
    /// Regions for 960x540 recordings.
    #[serde(default)]
    pub sd: Vec<Rect>,
}

impl RegionSet {
    /// Default overlay regions for luminance extraction.
    pub fn luminance() -> Self {
        Self {
            hd: vec![Rect::new(1250, 690, 641, 361)],
            sd: vec![Rect::new(718, 394, 242, 146)],
        }
    }

    /// Default overlay regions for motion extraction.
    ///
    /// A couple of pixels wider than the luminance regions so that the
    /// overlay border does not register as motion.
    pub fn motion() -> Self {
        Self {
            hd: vec![Rect::new(1248, 688, 643, 363)],
            sd: vec![Rect::new(717, 393, 243, 147)],
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for rect in self.hd.iter().chain(&self.sd) {
            if rect.w == 0 || rect.h == 0 {
                return Err(ConfigError::EmptyExclusion(*rect));
            }
        }
        Ok(())
    }
}

/// Masked screen regions applied by one analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionConfig {
    /// Apply the regions below.
    pub enabled: bool,
    /// Regions for 1920x1080 recordings.
    pub hd: Vec<Rect>,
    /// Regions for 960x540 recordings.
    pub sd: Vec<Rect>,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self::from_regions(false, RegionSet::luminance())
    }
}

impl ExclusionConfig {
    /// Creates an analyzer's exclusion settings from a region set.
    pub fn from_regions(enabled: bool, regions: RegionSet) -> Self {
        Self {
            enabled,
            hd: regions.hd,
            sd: regions.sd,
        }
    }
}

/// The `[exclusions]` section: one region set per signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionProfiles {
    /// Apply exclusion regions at all.
    pub enabled: bool,
    /// Regions for luminance extraction (`[exclusions.luminance]`).
    pub luminance: RegionSet,
    /// Regions for motion extraction (`[exclusions.motion]`).
    pub motion: RegionSet,
}

impl Default for ExclusionProfiles {
    fn default() -> Self {
        Self {
            enabled: false,
            luminance: RegionSet::luminance(),
            motion: RegionSet::motion(),
        }
    }
}

impl ExclusionProfiles {
    /// Returns the settings for the analyzer of `kind`.
    pub fn for_kind(&self, kind: SignalKind) -> ExclusionConfig {
        let regions = match kind {
            SignalKind::Luminance => &self.luminance,
            SignalKind::Motion => &self.motion,
        };
        ExclusionConfig::from_regions(self.enabled, regions.clone())
    }

    /// Validates every region set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.luminance.validate()?;
        self.motion.validate()
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// `[generation]` table.
    #[serde(default)]
    pub generation: GenerationConfig,
    /// `[analysis]` table.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// `[exclusions]` table with per-signal regions.
    #[serde(default)]
    pub exclusions: ExclusionProfiles,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generation.validate()?;
        self.analysis.validate()?;
        self.exclusions.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_sampling_rate_invalid() {
        let mut config = AnalysisConfig::default();
        config.sampling_rate = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRate {
                name: "sampling_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_sampling_rate_ignored_per_frame() {
        let config = AnalysisConfig {
            run_over_time: false,
            sampling_rate: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_mode(), SampleMode::PerFrame);
    }

    #[test]
    fn test_negative_threshold_invalid() {
        let config = AnalysisConfig {
            motion_threshold: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = FileConfig::from_toml(
            r#"
            [analysis]
            sampling_rate = 500
            run_over_time = true

            [exclusions]
            enabled = true

            [exclusions.luminance]
            hd = [{ x = 10, y = 20, w = 30, h = 40 }]
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.sampling_rate, 500);
        assert_eq!(config.analysis.skip_starting_frames, 0);
        assert_eq!(config.generation.refresh_rate, 144.0);
        assert!(config.exclusions.enabled);
        assert_eq!(config.exclusions.luminance.hd, vec![Rect::new(10, 20, 30, 40)]);
        assert!(config.exclusions.luminance.sd.is_empty());
        assert_eq!(config.exclusions.motion, RegionSet::motion());
    }

    #[test]
    fn test_motion_and_luminance_regions_differ() {
        let profiles = ExclusionProfiles {
            enabled: true,
            ..Default::default()
        };

        let luminance = profiles.for_kind(SignalKind::Luminance);
        let motion = profiles.for_kind(SignalKind::Motion);

        assert!(luminance.enabled && motion.enabled);
        assert_eq!(luminance.sd, vec![Rect::new(718, 394, 242, 146)]);
        assert_eq!(motion.sd, vec![Rect::new(717, 393, 243, 147)]);
        assert_eq!(motion.hd, vec![Rect::new(1248, 688, 643, 363)]);
        assert_eq!(ExclusionConfig::default().hd, RegionSet::luminance().hd);
    }

    #[test]
    fn test_zero_area_exclusion_rejected() {
        let result = FileConfig::from_toml(
            r#"
            [exclusions.motion]
            sd = [{ x = 0, y = 0, w = 0, h = 5 }]
            "#,
        );
        assert!(matches!(result, Err(ConfigError::EmptyExclusion(_))));
    }

    #[test]
    fn test_malformed_toml_reports_parse_error() {
        let result = FileConfig::from_toml("[analysis\nsampling_rate = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}

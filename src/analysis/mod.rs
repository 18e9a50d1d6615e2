//! Per-frame scalar analysis.
//!
//! Each analyzer reduces a frame to a single number: mean luminance, or
//! mean thresholded difference from the previous frame. Analyzers hold
//! only what the next frame needs (the exclusion mask, the previous
//! grayscale plane) and are reset between recordings.

mod exclusion;
mod luminance;
mod motion;

pub use exclusion::{ExclusionMask, ExclusionResolver, Rect, Resolution};
pub use luminance::{pixel_luminance, LuminanceAnalyzer};
pub use motion::{grayscale, MotionAnalyzer, TemporalDifferencer};

use crate::config::{AnalysisConfig, ExclusionProfiles};
use crate::source::Frame;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while analysing a recording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Exclusions are enabled but no profile exists for this size.
    #[error("unsupported resolution {width}x{height} for exclusion regions")]
    UnsupportedResolution {
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
    },
    /// Every pixel is masked, so there is nothing to average.
    #[error("exclusion regions cover the whole {width}x{height} frame")]
    FullyExcluded {
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
    },
    /// A frame differs in size from the first frame of the recording.
    #[error("frame size changed from {expected:?} to {found:?}")]
    DimensionMismatch {
        /// Size of the first frame.
        expected: (u32, u32),
        /// Size of the offending frame.
        found: (u32, u32),
    },
}

/// Which signal is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// Mean relative luminance in `[0, 1]`.
    Luminance,
    /// Mean thresholded frame difference on the 0-255 scale.
    Motion,
}

impl SignalKind {
    /// Column header in the persisted table.
    pub fn column_name(&self) -> &'static str {
        match self {
            SignalKind::Luminance => "Luminance",
            SignalKind::Motion => "Motion",
        }
    }

    /// Suffix used for output file names.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            SignalKind::Luminance => "luminance",
            SignalKind::Motion => "motion",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_suffix())
    }
}

/// Reduces frames to one scalar each.
pub trait FrameAnalyzer {
    /// The signal this analyzer produces.
    fn kind(&self) -> SignalKind;

    /// Analyses a frame.
    ///
    /// Returns `None` if the frame yields no value (e.g. the first frame
    /// of a differencing analyzer).
    fn analyze(&mut self, frame: &Frame) -> Result<Option<f64>, AnalysisError>;

    /// Clears per-recording state.
    fn reset(&mut self);
}

/// Builds the analyzer for `kind` from configuration.
pub fn analyzer_for(
    kind: SignalKind,
    analysis: &AnalysisConfig,
    exclusions: &ExclusionProfiles,
) -> Box<dyn FrameAnalyzer> {
    let exclusions = exclusions.for_kind(kind);
    match kind {
        SignalKind::Luminance => Box::new(LuminanceAnalyzer::new(exclusions)),
        SignalKind::Motion => Box::new(MotionAnalyzer::new(analysis.motion_threshold, exclusions)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_kind_names() {
        assert_eq!(SignalKind::Luminance.column_name(), "Luminance");
        assert_eq!(SignalKind::Motion.column_name(), "Motion");
        assert_eq!(SignalKind::Motion.to_string(), "motion");
    }

    #[test]
    fn test_factory_builds_requested_kind() {
        let analysis = AnalysisConfig::default();
        let exclusions = ExclusionProfiles::default();

        for kind in [SignalKind::Luminance, SignalKind::Motion] {
            assert_eq!(analyzer_for(kind, &analysis, &exclusions).kind(), kind);
        }
    }
}

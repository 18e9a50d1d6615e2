//! Inter-frame motion energy.
//!
//! Frames are reduced to 8-bit grayscale, differenced against the
//! previous frame, and differences under the noise threshold dropped.
//! Excluded pixels are zeroed before differencing, so they still count
//! towards the mean (as zero motion) unlike in the luminance analyzer.

use super::{AnalysisError, ExclusionResolver, FrameAnalyzer, SignalKind};
use crate::config::ExclusionConfig;
use crate::source::Frame;

/// 8-bit grayscale of one RGB pixel.
///
/// Fixed-point BT.601 weights (0.299, 0.587, 0.114) with rounding.
#[inline]
pub fn grayscale([r, g, b]: [u8; 3]) -> u8 {
    ((u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868 + 8192) >> 14) as u8
}

/// Computes differences between consecutive grayscale planes.
///
/// Static content cancels out; only changes between frames remain.
#[derive(Debug, Clone, Default)]
pub struct TemporalDifferencer {
    /// Previous plane for differencing.
    previous: Option<Vec<u8>>,
}

impl TemporalDifferencer {
    /// Creates an unprimed differencer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the absolute difference with the previous plane.
    ///
    /// Returns `None` on the first plane (no previous to compare).
    pub fn difference(&mut self, current: Vec<u8>) -> Option<Vec<u8>> {
        let result = self.previous.as_ref().map(|prev| {
            current
                .iter()
                .zip(prev.iter())
                .map(|(&c, &p)| c.abs_diff(p))
                .collect()
        });

        // Store current as previous for next call
        self.previous = Some(current);

        result
    }

    /// Resets the differencer state.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Returns true if ready to produce output.
    pub fn is_primed(&self) -> bool {
        self.previous.is_some()
    }
}

/// Mean thresholded frame difference.
#[derive(Debug, Clone)]
pub struct MotionAnalyzer {
    /// Differences below this (0-255 scale) are treated as noise.
    threshold: f64,
    exclusions: ExclusionResolver,
    differencer: TemporalDifferencer,
}

impl MotionAnalyzer {
    /// Creates an analyzer with the given noise threshold.
    pub fn new(threshold: f64, exclusions: ExclusionConfig) -> Self {
        Self {
            threshold,
            exclusions: ExclusionResolver::new(exclusions),
            differencer: TemporalDifferencer::new(),
        }
    }

    /// Returns the noise threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl FrameAnalyzer for MotionAnalyzer {
    fn kind(&self) -> SignalKind {
        SignalKind::Motion
    }

    fn analyze(&mut self, frame: &Frame) -> Result<Option<f64>, AnalysisError> {
        let mask = self.exclusions.mask_for(frame)?;
        let gray: Vec<u8> = frame
            .rgb_pixels()
            .enumerate()
            .map(|(i, rgb)| if mask.is_excluded(i) { 0 } else { grayscale(rgb) })
            .collect();

        let Some(diff) = self.differencer.difference(gray) else {
            return Ok(None);
        };
        if diff.is_empty() {
            return Ok(Some(0.0));
        }

        let threshold = self.threshold;
        let sum: u64 = diff
            .iter()
            .filter(|&&d| f64::from(d) >= threshold)
            .map(|&d| u64::from(d))
            .sum();

        Ok(Some(sum as f64 / diff.len() as f64))
    }

    fn reset(&mut self) {
        self.differencer.reset();
        self.exclusions.reset();
    }
}

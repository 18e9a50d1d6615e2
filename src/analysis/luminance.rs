//! Mean relative luminance.
//!
//! Uses the Rec. 709 weights on channel values scaled to `[0, 1]`.
//! Excluded pixels are left out of the mean entirely.

use super::{AnalysisError, ExclusionResolver, FrameAnalyzer, SignalKind};
use crate::config::ExclusionConfig;
use crate::source::Frame;

const WEIGHTS: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// Luminance of one RGB pixel in `[0, 1]`.
#[inline]
pub fn pixel_luminance([r, g, b]: [u8; 3]) -> f64 {
    (WEIGHTS[0] * f64::from(r) + WEIGHTS[1] * f64::from(g) + WEIGHTS[2] * f64::from(b)) / 255.0
}

/// Average luminance over the unmasked part of each frame.
#[derive(Debug, Clone)]
pub struct LuminanceAnalyzer {
    exclusions: ExclusionResolver,
}

impl LuminanceAnalyzer {
    /// Creates an analyzer applying `exclusions`.
    pub fn new(exclusions: ExclusionConfig) -> Self {
        Self {
            exclusions: ExclusionResolver::new(exclusions),
        }
    }
}

impl FrameAnalyzer for LuminanceAnalyzer {
    fn kind(&self) -> SignalKind {
        SignalKind::Luminance
    }

    fn analyze(&mut self, frame: &Frame) -> Result<Option<f64>, AnalysisError> {
        let mask = self.exclusions.mask_for(frame)?;
        let included = mask.included_count();
        if included == 0 {
            return Err(AnalysisError::FullyExcluded {
                width: frame.width(),
                height: frame.height(),
            });
        }

        let sum: f64 = frame
            .rgb_pixels()
            .enumerate()
            .filter(|&(i, _)| !mask.is_excluded(i))
            .map(|(_, rgb)| pixel_luminance(rgb))
            .sum();

        Ok(Some(sum / included as f64))
    }

    fn reset(&mut self) {
        self.exclusions.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Rect;
    use image::{Rgb, RgbImage};

    fn analyzer() -> LuminanceAnalyzer {
        LuminanceAnalyzer::new(ExclusionConfig::default())
    }

    #[test]
    fn test_black_frame_is_zero() {
        let value = analyzer()
            .analyze(&Frame::solid(16, 9, [0, 0, 0], 1))
            .unwrap();
        assert_eq!(value, Some(0.0));
    }

    #[test]
    fn test_white_frame_is_one() {
        let value = analyzer()
            .analyze(&Frame::solid(16, 9, [255, 255, 255], 1))
            .unwrap()
            .unwrap();
        assert!((value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_green_dominates() {
        assert!(pixel_luminance([0, 255, 0]) > pixel_luminance([255, 0, 0]));
        assert!(pixel_luminance([255, 0, 0]) > pixel_luminance([0, 0, 255]));
        assert!((pixel_luminance([0, 0, 255]) - 0.0722).abs() < 1e-12);
    }

    #[test]
    fn test_excluded_pixels_omitted_from_mean() {
        // Left half white, right half black; exclude the black half
        let mut image = RgbImage::from_pixel(960, 540, Rgb([0, 0, 0]));
        for y in 0..540 {
            for x in 0..480 {
                image.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let frame = Frame::new(image, 1);

        let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig {
            enabled: true,
            hd: vec![],
            sd: vec![Rect::new(480, 0, 480, 540)],
        });

        // Omitted, not zeroed: the mean stays at white
        let value = analyzer.analyze(&frame).unwrap().unwrap();
        assert!((value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fully_excluded_frame_rejected() {
        let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig {
            enabled: true,
            hd: vec![],
            sd: vec![Rect::new(0, 0, 960, 540)],
        });

        assert!(matches!(
            analyzer.analyze(&Frame::solid(960, 540, [9, 9, 9], 1)),
            Err(AnalysisError::FullyExcluded { .. })
        ));
    }

    #[test]
    fn test_unsupported_resolution_with_exclusions() {
        let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig {
            enabled: true,
            ..Default::default()
        });

        assert!(matches!(
            analyzer.analyze(&Frame::solid(640, 480, [0; 3], 1)),
            Err(AnalysisError::UnsupportedResolution {
                width: 640,
                height: 480
            })
        ));
    }
}

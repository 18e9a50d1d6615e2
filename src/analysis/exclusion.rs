//! Exclusion regions.
//!
//! Screen recordings sometimes carry an overlay (picture-in-picture of
//! the participant, for instance) that must not contribute to the
//! signal. Regions are configured per recording resolution; the
//! resolution is classified once per recording and the resulting mask
//! reused for every frame.

use super::AnalysisError;
use crate::config::ExclusionConfig;
use crate::source::Frame;
use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle `(x, y, w, h)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Returns the `[x0, x1) x [y0, y1)` span clipped to a frame, or
    /// `None` if the rectangle lies entirely outside it.
    fn clipped(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x1 = self.x.saturating_add(self.w).min(width);
        let y1 = self.y.saturating_add(self.h).min(height);
        (self.x < x1 && self.y < y1).then_some((self.x, x1, self.y, y1))
    }
}

/// Recording resolutions with known exclusion profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 1920x1080.
    Hd,
    /// 960x540.
    Sd,
    /// Anything else.
    Unsupported {
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
    },
}

impl Resolution {
    /// Classifies frame dimensions.
    pub fn classify(width: u32, height: u32) -> Self {
        match (width, height) {
            (1920, 1080) => Resolution::Hd,
            (960, 540) => Resolution::Sd,
            _ => Resolution::Unsupported { width, height },
        }
    }

    /// Returns the configured regions for this resolution.
    pub fn regions<'a>(&self, config: &'a ExclusionConfig) -> Option<&'a [Rect]> {
        match self {
            Resolution::Hd => Some(&config.hd),
            Resolution::Sd => Some(&config.sd),
            Resolution::Unsupported { .. } => None,
        }
    }
}

/// Per-pixel exclusion flags for one recording.
#[derive(Debug, Clone)]
pub struct ExclusionMask {
    width: u32,
    height: u32,
    /// Row-major, one flag per pixel.
    excluded: Vec<bool>,
    excluded_count: usize,
}

impl ExclusionMask {
    /// A mask that excludes nothing.
    pub fn none(width: u32, height: u32) -> Self {
        Self::from_rects(width, height, &[])
    }

    /// Builds a mask from rectangles, clipping them to the frame.
    ///
    /// Overlapping rectangles are fine.
    pub fn from_rects(width: u32, height: u32, rects: &[Rect]) -> Self {
        let mut excluded = vec![false; width as usize * height as usize];
        for rect in rects {
            if let Some((x0, x1, y0, y1)) = rect.clipped(width, height) {
                for y in y0..y1 {
                    let row = y as usize * width as usize;
                    excluded[row + x0 as usize..row + x1 as usize].fill(true);
                }
            }
        }
        let excluded_count = excluded.iter().filter(|&&e| e).count();

        Self {
            width,
            height,
            excluded,
            excluded_count,
        }
    }

    /// Resolves the mask for a recording of the given size.
    ///
    /// With exclusions enabled, an unrecognised resolution is an error.
    pub fn resolve(
        config: &ExclusionConfig,
        width: u32,
        height: u32,
    ) -> Result<Self, AnalysisError> {
        if !config.enabled {
            return Ok(Self::none(width, height));
        }

        let resolution = Resolution::classify(width, height);
        let rects = resolution
            .regions(config)
            .ok_or(AnalysisError::UnsupportedResolution { width, height })?;

        let mask = Self::from_rects(width, height, rects);
        tracing::debug!(
            ?resolution,
            regions = rects.len(),
            excluded_pixels = mask.excluded_count,
            "Exclusion mask resolved"
        );
        Ok(mask)
    }

    /// Returns true if the pixel at row-major position `pixel` is masked.
    #[inline]
    pub fn is_excluded(&self, pixel: usize) -> bool {
        self.excluded[pixel]
    }

    /// Returns the mask dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the number of masked pixels.
    pub fn excluded_count(&self) -> usize {
        self.excluded_count
    }

    /// Returns the number of pixels that remain.
    pub fn included_count(&self) -> usize {
        self.excluded.len() - self.excluded_count
    }
}

/// Resolves the mask on the first frame of a recording and checks that
/// later frames keep the same size.
#[derive(Debug, Clone)]
pub struct ExclusionResolver {
    config: ExclusionConfig,
    mask: Option<ExclusionMask>,
}

impl ExclusionResolver {
    /// Creates a resolver; nothing is resolved until the first frame.
    pub fn new(config: ExclusionConfig) -> Self {
        Self { config, mask: None }
    }

    /// Returns the mask for `frame`, resolving it on first use.
    pub fn mask_for(&mut self, frame: &Frame) -> Result<&ExclusionMask, AnalysisError> {
        let found = (frame.width(), frame.height());
        let mask = match self.mask.take() {
            Some(mask) => mask,
            None => ExclusionMask::resolve(&self.config, found.0, found.1)?,
        };

        if mask.dimensions() != found {
            let expected = mask.dimensions();
            self.mask = Some(mask);
            return Err(AnalysisError::DimensionMismatch { expected, found });
        }

        Ok(self.mask.insert(mask))
    }

    /// Forgets the resolved mask.
    pub fn reset(&mut self) {
        self.mask = None;
    }
}

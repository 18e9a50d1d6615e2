//! Frame type representing one decoded image of a recording.

use image::{Rgb, RgbImage};

/// A single decoded frame.
///
/// Pixels are 8-bit RGB in row-major order.
#[derive(Clone)]
pub struct Frame {
    /// Decoded pixel grid.
    image: RgbImage,
    /// 1-based position in the source.
    index: u64,
}

impl Frame {
    /// Creates a new frame from a decoded image.
    pub fn new(image: RgbImage, index: u64) -> Self {
        Self { image, index }
    }

    /// Creates a frame filled with a single colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3], index: u64) -> Self {
        Self::new(RgbImage::from_pixel(width, height, Rgb(rgb)), index)
    }

    /// Returns the pixel grid.
    #[inline]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Returns the raw interleaved RGB bytes.
    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Returns the position in the source.
    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width() as usize) * (self.height() as usize)
    }

    /// Iterates over pixels as `[r, g, b]` in row-major order.
    pub fn rgb_pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.image.as_raw().chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("index", &self.index)
            .finish()
    }
}

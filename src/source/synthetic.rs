//! Synthetic frame source for testing and dry runs.

use super::{Frame, FrameSource, SourceError};
use image::{Rgb, RgbImage};
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};

/// What a synthetic source draws on each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Every frame the same colour.
    Solid([u8; 3]),
    /// Alternates between two colours every `half_period` frames,
    /// starting with `on`.
    Flicker {
        /// Colour of the first phase.
        on: [u8; 3],
        /// Colour of the second phase.
        off: [u8; 3],
        /// Frames per phase.
        half_period: u64,
    },
}

impl Pattern {
    fn colour_at(&self, index: u64) -> [u8; 3] {
        match *self {
            Pattern::Solid(rgb) => rgb,
            Pattern::Flicker {
                on,
                off,
                half_period,
            } => {
                let phase = index.saturating_sub(1) / half_period.max(1);
                if phase % 2 == 0 {
                    on
                } else {
                    off
                }
            }
        }
    }
}

/// Additive per-channel noise, uniform in `[-amplitude, amplitude]`.
#[derive(Debug)]
struct Noise {
    rng: ChaCha8Rng,
    amplitude: u8,
}

/// Frame source that generates a fixed number of frames in memory.
///
/// Output is deterministic for a given pattern and noise seed.
#[derive(Debug)]
pub struct SyntheticSource {
    frame_rate: f64,
    width: u32,
    height: u32,
    frame_count: u64,
    pattern: Pattern,
    noise: Option<Noise>,
    emitted: u64,
}

impl SyntheticSource {
    /// Creates a source of `frame_count` black frames.
    pub fn new(frame_rate: f64, width: u32, height: u32, frame_count: u64) -> Self {
        Self {
            frame_rate,
            width,
            height,
            frame_count,
            pattern: Pattern::Solid([0, 0, 0]),
            noise: None,
            emitted: 0,
        }
    }

    /// Sets the drawing pattern.
    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Adds seeded sensor-like noise to every channel.
    pub fn with_noise(mut self, seed: u64, amplitude: u8) -> Self {
        self.noise = (amplitude > 0).then(|| Noise {
            rng: ChaCha8Rng::seed_from_u64(seed),
            amplitude,
        });
        self
    }

    /// Returns the number of frames not yet read.
    pub fn remaining(&self) -> u64 {
        self.frame_count - self.emitted
    }
}

impl FrameSource for SyntheticSource {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.emitted >= self.frame_count {
            return Ok(None);
        }
        self.emitted += 1;

        let base = self.pattern.colour_at(self.emitted);
        let mut image = RgbImage::from_pixel(self.width, self.height, Rgb(base));

        if let Some(noise) = self.noise.as_mut() {
            let span = u32::from(noise.amplitude) * 2 + 1;
            for channel in image.iter_mut() {
                let offset = (noise.rng.next_u32() % span) as i16 - i16::from(noise.amplitude);
                *channel = (i16::from(*channel) + offset).clamp(0, 255) as u8;
            }
        }

        Ok(Some(Frame::new(image, self.emitted)))
    }
}

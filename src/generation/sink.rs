//! Frame sink abstraction.
//!
//! A sink receives the flashes of a stimulus clip in display order,
//! each with its on-screen duration, and produces one finished output.

use image::RgbImage;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing a stimulus clip.
#[derive(Debug, Error)]
pub enum SinkError {
    /// `write_flash` or `finish` called before `begin`.
    #[error("sink not started")]
    NotStarted,
    /// A still could not be encoded.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
    /// Writing output failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// What is on screen during one flash.
#[derive(Debug, Clone, Copy)]
pub enum FlashContent<'a> {
    /// Stimulus number `index`, already composed onto the screen canvas.
    Image {
        /// Position in the stimulus list.
        index: usize,
        /// Full-screen canvas.
        image: &'a RgbImage,
    },
    /// An all-black screen.
    Blank,
}

/// Trait for stimulus clip writers.
pub trait FrameSink {
    /// Prepares a clip at `frame_rate` with the given canvas size.
    fn begin(&mut self, frame_rate: f64, width: u32, height: u32) -> Result<(), SinkError>;

    /// Appends one flash lasting `duration_seconds`.
    fn write_flash(
        &mut self,
        content: FlashContent<'_>,
        duration_seconds: f64,
    ) -> Result<(), SinkError>;

    /// Completes the clip and returns where it was written.
    fn finish(&mut self) -> Result<PathBuf, SinkError>;
}

/// What a [`MemorySink`] saw for one flash.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedFlash {
    /// Stimulus index, or `None` for a blank flash.
    pub stimulus: Option<usize>,
    /// On-screen time.
    pub duration_seconds: f64,
}

/// Sink that records flashes in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// `(frame_rate, width, height)` once started.
    pub format: Option<(f64, u32, u32)>,
    /// Flashes in display order.
    pub flashes: Vec<RecordedFlash>,
    /// Set by `finish`.
    pub finished: bool,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total on-screen time of all recorded flashes.
    pub fn total_duration_seconds(&self) -> f64 {
        self.flashes.iter().map(|f| f.duration_seconds).sum()
    }
}

impl FrameSink for MemorySink {
    fn begin(&mut self, frame_rate: f64, width: u32, height: u32) -> Result<(), SinkError> {
        self.format = Some((frame_rate, width, height));
        self.flashes.clear();
        self.finished = false;
        Ok(())
    }

    fn write_flash(
        &mut self,
        content: FlashContent<'_>,
        duration_seconds: f64,
    ) -> Result<(), SinkError> {
        if self.format.is_none() {
            return Err(SinkError::NotStarted);
        }
        let stimulus = match content {
            FlashContent::Image { index, .. } => Some(index),
            FlashContent::Blank => None,
        };
        self.flashes.push(RecordedFlash {
            stimulus,
            duration_seconds,
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<PathBuf, SinkError> {
        if self.format.is_none() {
            return Err(SinkError::NotStarted);
        }
        self.finished = true;
        Ok(PathBuf::from("memory"))
    }
}

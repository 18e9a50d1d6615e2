//! Frame sources.
//!
//! A frame source yields the decoded frames of one recording in order,
//! together with the recording's native frame rate. End of stream is
//! explicit (`Ok(None)`); a source is restarted only by reopening it.

mod frame;
mod sequence;
mod synthetic;

pub use frame::Frame;
pub use sequence::ImageSequenceSource;
pub use synthetic::{Pattern, SyntheticSource};

use thiserror::Error;

/// Errors that can occur while reading frames.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The recording could not be opened.
    #[error("frame source unavailable: {0}")]
    Unavailable(String),
    /// A frame could not be decoded.
    #[error("failed to read frame {index}: {reason}")]
    ReadFailed {
        /// 1-based frame position.
        index: u64,
        /// Decoder message.
        reason: String,
    },
    /// The source reported a non-positive or non-finite rate.
    #[error("source reports invalid frame rate {0}")]
    InvalidFrameRate(f64),
}

/// Trait for frame source implementations.
///
/// This abstraction allows swapping between decoded recordings and
/// synthetic frames for testing.
pub trait FrameSource {
    /// Native frame rate in Hz.
    fn frame_rate(&self) -> f64;

    /// Reads the next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn frame_rate(&self) -> f64 {
        (**self).frame_rate()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        (**self).next_frame()
    }
}

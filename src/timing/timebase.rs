//! Frame clock.

use crate::config::{positive, ConfigError};

/// `frame_index` discrete events observed at `rate` events per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBase {
    pub(super) rate: f64,
    pub(super) frame_index: u64,
}

impl TimeBase {
    /// Creates a time base, rejecting non-positive or non-finite rates.
    pub fn new(rate: f64, frame_index: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            rate: positive("rate", rate)?,
            frame_index,
        })
    }

    /// Returns the event rate in Hz.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns the number of events observed.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Seconds covered by the observed events.
    pub fn elapsed_seconds(&self) -> f64 {
        self.frame_index as f64 / self.rate
    }

    /// Real-valued number of samples a `target_rate` clock would have
    /// produced over the same elapsed time.
    ///
    /// Multiplies before dividing so integral ratios stay exact.
    pub fn ideal_samples_at(&self, target_rate: f64) -> f64 {
        self.frame_index as f64 * target_rate / self.rate
    }

    /// Returns a copy advanced by `frames` events.
    pub fn advanced(self, frames: u64) -> Self {
        Self {
            frame_index: self.frame_index + frames,
            ..self
        }
    }
}

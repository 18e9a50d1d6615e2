//! Drift-corrected rate conversion.
//!
//! Converts a stream of video frames at `fps` into samples at a fixed
//! target rate. Every frame emits `floor(target_rate / fps)` samples;
//! when the running count falls a whole sample behind the ideal
//! elapsed-time count, one extra catch-up sample is emitted for that
//! frame. The cumulative count therefore never lags the ideal by a full
//! sample and never runs ahead of it.

use super::TimeBase;
use crate::config::{positive, ConfigError};

/// Running totals for one video.
///
/// Created when a video is opened and dropped when it ends; never
/// shared between videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionState {
    /// Samples emitted so far.
    pub emitted_count: u64,
    /// Source frames consumed so far.
    pub source_frame_index: u64,
}

/// How many samples each analysed frame produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleMode {
    /// Resample onto a fixed external clock.
    OverTime {
        /// Output samples per second.
        target_rate: f64,
    },
    /// One sample per frame regardless of rates.
    PerFrame,
}

/// Guaranteed samples per frame.
fn base_count(fps: f64, target_rate: f64) -> u64 {
    (target_rate / fps).floor() as u64
}

/// Single conversion step shared by [`advance`] and [`RateConverter`].
///
/// Returns the samples to emit, the new state, and whether a catch-up
/// sample was included.
fn step(
    state: ConversionState,
    base: u64,
    fps: f64,
    target_rate: f64,
) -> (u64, ConversionState, bool) {
    let source_frame_index = state.source_frame_index + 1;
    let ideal = TimeBase {
        rate: fps,
        frame_index: source_frame_index,
    }
    .ideal_samples_at(target_rate);

    // At most one extra sample per frame.
    let catch_up = (state.emitted_count + base + 1) as f64 <= ideal;
    let samples = base + u64::from(catch_up);

    let next = ConversionState {
        emitted_count: state.emitted_count + samples,
        source_frame_index,
    };
    (samples, next, catch_up)
}

/// Advances `state` by one source frame.
///
/// Pure form of [`RateConverter::advance`] for callers that keep their
/// own state. Returns the number of samples to emit for this frame.
pub fn advance(
    state: ConversionState,
    fps: f64,
    target_rate: f64,
) -> Result<(u64, ConversionState), ConfigError> {
    let fps = positive("fps", fps)?;
    let target_rate = positive("target_rate", target_rate)?;
    let (samples, next, _) = step(state, base_count(fps, target_rate), fps, target_rate);
    Ok((samples, next))
}

/// Per-video rate converter.
///
/// Call [`advance`](Self::advance) exactly once per analysed frame, in
/// frame order.
#[derive(Debug, Clone)]
pub struct RateConverter {
    fps: f64,
    mode: SampleMode,
    /// Constant for a fixed fps/target pair.
    base_count: u64,
    state: ConversionState,
    catch_up_total: u64,
}

impl RateConverter {
    /// Creates a converter for a source running at `fps`.
    pub fn new(fps: f64, mode: SampleMode) -> Result<Self, ConfigError> {
        let fps = positive("fps", fps)?;
        let base_count = match mode {
            SampleMode::OverTime { target_rate } => {
                base_count(fps, positive("target_rate", target_rate)?)
            }
            SampleMode::PerFrame => 1,
        };

        tracing::debug!(fps, ?mode, base_count, "Rate converter created");

        Ok(Self {
            fps,
            mode,
            base_count,
            state: ConversionState::default(),
            catch_up_total: 0,
        })
    }

    /// Consumes one source frame and returns how many samples to emit.
    pub fn advance(&mut self) -> u64 {
        match self.mode {
            SampleMode::PerFrame => {
                self.state.source_frame_index += 1;
                self.state.emitted_count += 1;
                1
            }
            SampleMode::OverTime { target_rate } => {
                let (samples, next, catch_up) =
                    step(self.state, self.base_count, self.fps, target_rate);
                self.state = next;
                if catch_up {
                    self.catch_up_total += 1;
                    tracing::trace!(
                        frame = next.source_frame_index,
                        emitted = next.emitted_count,
                        "Inserted catch-up sample"
                    );
                }
                samples
            }
        }
    }

    /// Consumes a source frame that produced no value.
    ///
    /// The frame still counts as elapsed time, so the samples it would
    /// have carried are recovered by later frames, one catch-up sample
    /// per frame. Per-frame mode has no clock and ignores it.
    pub fn skip_frame(&mut self) {
        if let SampleMode::OverTime { .. } = self.mode {
            self.state.source_frame_index += 1;
        }
    }

    /// Returns the current totals.
    #[inline]
    pub fn state(&self) -> ConversionState {
        self.state
    }

    /// Returns the sampling mode.
    #[inline]
    pub fn mode(&self) -> SampleMode {
        self.mode
    }

    /// Returns the minimum samples emitted for every frame.
    #[inline]
    pub fn base_count(&self) -> u64 {
        self.base_count
    }

    /// Returns the number of catch-up samples inserted so far.
    #[inline]
    pub fn catch_up_total(&self) -> u64 {
        self.catch_up_total
    }

    /// Ideal real-valued sample count at the current frame.
    pub fn ideal_count(&self) -> f64 {
        match self.mode {
            SampleMode::OverTime { target_rate } => TimeBase {
                rate: self.fps,
                frame_index: self.state.source_frame_index,
            }
            .ideal_samples_at(target_rate),
            SampleMode::PerFrame => self.state.source_frame_index as f64,
        }
    }

    /// How far the emitted count trails the ideal count, in samples.
    ///
    /// Stays in `[0, 1)` unless frames were skipped with
    /// [`skip_frame`](Self::skip_frame); it then shrinks back below one
    /// as catch-up samples are inserted.
    pub fn drift(&self) -> f64 {
        self.ideal_count() - self.state.emitted_count as f64
    }
}

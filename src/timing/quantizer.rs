//! Flicker frequency quantization.
//!
//! Displays only change on whole refresh frames. A 10 Hz flicker on a
//! 144 Hz screen would need 7.2 frames per half-cycle, so some flashes
//! would land early and some late. The quantizer snaps the half-cycle
//! to a whole number of frames and reports the frequency that actually
//! results.

use super::TimeBase;
use crate::config::{positive, ConfigError};

/// A corrected flicker frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyAdjustment {
    /// Frequency the caller asked for, in Hz.
    pub requested: f64,
    /// Nearest frequency with a whole-frame half-cycle, in Hz.
    pub actual: f64,
}

/// Flash timing for one stimulus-generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct FlashPlan {
    /// Refresh frames in each ON or OFF phase.
    pub frames_per_half_cycle: u32,
    /// Frequency the caller asked for, in Hz.
    pub requested_frequency: f64,
    /// Frequency actually rendered, in Hz.
    pub actual_frequency: f64,
    /// Full ON/OFF cycles shown per stimulus.
    pub cycles_per_stimulus: u32,
    /// Length of a single ON or OFF phase in seconds.
    pub flash_duration_seconds: f64,
    /// Number of stimuli shown in sequence.
    pub stimulus_count: usize,
    /// Display refresh rate in Hz.
    pub refresh_rate: f64,
    /// Requested clip duration in seconds.
    pub clip_duration_seconds: f64,
}

impl FlashPlan {
    /// Returns true if the requested frequency had to be changed.
    pub fn is_corrected(&self) -> bool {
        self.actual_frequency != self.requested_frequency
    }

    /// Returns the correction applied, if any.
    pub fn frequency_adjustment(&self) -> Option<FrequencyAdjustment> {
        self.is_corrected().then_some(FrequencyAdjustment {
            requested: self.requested_frequency,
            actual: self.actual_frequency,
        })
    }

    /// Refresh frames rendered per stimulus.
    pub fn frames_per_stimulus(&self) -> u64 {
        u64::from(self.frames_per_half_cycle) * 2 * u64::from(self.cycles_per_stimulus)
    }

    /// Realised on-screen time per stimulus in seconds.
    pub fn stimulus_duration_seconds(&self) -> f64 {
        self.flash_duration_seconds * f64::from(self.cycles_per_stimulus) * 2.0
    }

    /// Realised length of the whole clip in seconds.
    ///
    /// Flashes are never cut short, so this can exceed the requested
    /// clip duration by up to one cycle per stimulus.
    pub fn total_duration_seconds(&self) -> f64 {
        self.stimulus_duration_seconds() * self.stimulus_count as f64
    }

    /// Time by which the rendered clip exceeds the requested duration.
    pub fn overrun_seconds(&self) -> f64 {
        self.total_duration_seconds() - self.clip_duration_seconds
    }
}

/// Refresh frames per half-cycle for the given split.
fn half_cycle_frames(frames_per_stimulus: f64, frequency: f64, stimulus_duration: f64) -> f64 {
    frames_per_stimulus / (frequency * stimulus_duration * 2.0)
}

/// Computes the flash plan for `stimulus_count` images sharing a clip.
///
/// Rounding follows round-half-to-even.
pub fn quantize(
    requested_frequency: f64,
    refresh_rate: f64,
    clip_duration: f64,
    stimulus_count: usize,
) -> Result<FlashPlan, ConfigError> {
    positive("requested_frequency", requested_frequency)?;
    positive("refresh_rate", refresh_rate)?;
    if !(clip_duration.is_finite() && clip_duration > 0.0) {
        return Err(ConfigError::InvalidDuration(clip_duration));
    }
    if stimulus_count == 0 {
        return Err(ConfigError::NoStimuli);
    }

    let total_frames = refresh_rate * clip_duration;
    let frames_per_stimulus = (total_frames / stimulus_count as f64).round_ties_even();
    if frames_per_stimulus < 1.0 {
        return Err(ConfigError::TooManyStimuli {
            stimulus_count,
            total_frames,
        });
    }
    let stimulus_duration = clip_duration / stimulus_count as f64;

    let raw = half_cycle_frames(frames_per_stimulus, requested_frequency, stimulus_duration);
    let snapped = raw.round_ties_even();
    if snapped < 1.0 {
        return Err(ConfigError::FrequencyTooHigh {
            requested: requested_frequency,
            refresh_rate,
            stimulus_duration,
        });
    }

    // Whole to within float noise counts as whole.
    let actual_frequency = if (raw - snapped).abs() <= 1e-9 * snapped {
        requested_frequency
    } else {
        let corrected = frames_per_stimulus / (snapped * stimulus_duration * 2.0);
        debug_assert!(
            (half_cycle_frames(frames_per_stimulus, corrected, stimulus_duration) - snapped).abs()
                < 1e-6
        );
        tracing::warn!(
            requested_hz = requested_frequency,
            corrected_hz = corrected,
            refresh_rate,
            "Stimulus frequency does not divide into the screen refresh rate"
        );
        corrected
    };

    let frames_per_half_cycle = snapped as u32;
    let cycles_per_stimulus = (frames_per_stimulus / (snapped * 2.0)).ceil() as u32;
    let flash_duration_seconds =
        TimeBase::new(refresh_rate, u64::from(frames_per_half_cycle))?.elapsed_seconds();

    let plan = FlashPlan {
        frames_per_half_cycle,
        requested_frequency,
        actual_frequency,
        cycles_per_stimulus,
        flash_duration_seconds,
        stimulus_count,
        refresh_rate,
        clip_duration_seconds: clip_duration,
    };

    tracing::debug!(
        frames_per_half_cycle,
        cycles_per_stimulus,
        flash_duration_seconds,
        total_duration_seconds = plan.total_duration_seconds(),
        "Flash plan computed"
    );

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ten_hz_on_144_hz_is_corrected() {
        let plan = quantize(10.0, 144.0, 1.0, 1).unwrap();

        // 144 / (10 * 2) = 7.2 frames, snapped to 7
        assert_eq!(plan.frames_per_half_cycle, 7);
        assert!((plan.actual_frequency - 144.0 / 14.0).abs() < 1e-12);
        assert!(plan.is_corrected());

        let adjustment = plan.frequency_adjustment().unwrap();
        assert_eq!(adjustment.requested, 10.0);
        assert!((adjustment.actual - 10.2857).abs() < 1e-4);
    }

    #[test]
    fn test_cycles_round_up_and_overrun_is_reported() {
        let plan = quantize(10.0, 144.0, 1.0, 1).unwrap();

        // ceil(144 / 14) = 11 cycles, 154 frames instead of 144
        assert_eq!(plan.cycles_per_stimulus, 11);
        assert_eq!(plan.frames_per_stimulus(), 154);
        assert!((plan.flash_duration_seconds - 7.0 / 144.0).abs() < 1e-12);
        assert!((plan.total_duration_seconds() - 154.0 / 144.0).abs() < 1e-12);
        assert!(plan.overrun_seconds() > 0.0);
    }

    #[test]
    fn test_exact_frequency_untouched() {
        let plan = quantize(12.0, 144.0, 1.0, 1).unwrap();

        assert_eq!(plan.frames_per_half_cycle, 6);
        assert_eq!(plan.actual_frequency, 12.0);
        assert!(!plan.is_corrected());
        assert!(plan.frequency_adjustment().is_none());
        assert_eq!(plan.cycles_per_stimulus, 12);
        assert!(plan.overrun_seconds().abs() < 1e-12);
    }

    #[test]
    fn test_fractional_stimulus_duration_not_corrected() {
        // 25s over 3 stimuli at 60 Hz: 200 frames over 25/3 s each,
        // exactly 30 frames per half-cycle at 1 Hz
        let plan = quantize(1.0, 60.0, 25.0, 3).unwrap();

        assert_eq!(plan.frames_per_half_cycle, 30);
        assert_eq!(plan.actual_frequency, 1.0);
        assert!(!plan.is_corrected());
        assert!(plan.frequency_adjustment().is_none());
    }

    #[test]
    fn test_stimuli_share_clip() {
        // 15s at 144 Hz across 4 images: 540 frames each
        let plan = quantize(1.5, 144.0, 15.0, 4).unwrap();

        assert_eq!(plan.stimulus_count, 4);
        // 540 / (1.5 * 3.75 * 2) = 48
        assert_eq!(plan.frames_per_half_cycle, 48);
        assert!(!plan.is_corrected());
        // ceil(540 / 96) = 6 cycles of 96 frames: 4s per stimulus
        assert_eq!(plan.cycles_per_stimulus, 6);
        assert!((plan.total_duration_seconds() - 16.0).abs() < 1e-9);
        assert!((plan.overrun_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_frequency_too_high_rejected() {
        // 100 Hz on a 60 Hz display: 0.3 frames per half-cycle
        assert!(matches!(
            quantize(100.0, 60.0, 1.0, 1),
            Err(ConfigError::FrequencyTooHigh { .. })
        ));
    }

    #[test]
    fn test_empty_image_set_rejected() {
        assert_eq!(quantize(10.0, 144.0, 1.0, 0), Err(ConfigError::NoStimuli));
    }

    #[test]
    fn test_more_stimuli_than_frames_rejected() {
        assert!(matches!(
            quantize(1.0, 10.0, 1.0, 50),
            Err(ConfigError::TooManyStimuli { .. })
        ));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(quantize(0.0, 144.0, 1.0, 1).is_err());
        assert!(quantize(10.0, -144.0, 1.0, 1).is_err());
        assert!(matches!(
            quantize(10.0, 144.0, 0.0, 1),
            Err(ConfigError::InvalidDuration(_))
        ));
        assert!(quantize(f64::NAN, 144.0, 1.0, 1).is_err());
    }

    proptest! {
        #[test]
        fn prop_integral_half_cycle_is_not_corrected(
            frequency in 1u32..30,
            half_cycle in 1u32..20,
            cycles_per_stimulus in 1u32..40,
            stimulus_count in 1usize..7,
        ) {
            // Per-stimulus time is a whole number of cycles, which is
            // usually a fraction of a second that f64 cannot hold exactly
            let refresh_rate = f64::from(2 * half_cycle * frequency);
            let duration =
                f64::from(cycles_per_stimulus) / f64::from(frequency) * stimulus_count as f64;

            let plan = quantize(f64::from(frequency), refresh_rate, duration, stimulus_count).unwrap();

            prop_assert_eq!(plan.frames_per_half_cycle, half_cycle);
            prop_assert_eq!(plan.actual_frequency, f64::from(frequency));
            prop_assert!(!plan.is_corrected());
        }

        #[test]
        fn prop_corrected_frequency_round_trips(
            frequency in 0.5f64..40.0,
            refresh_rate in prop::sample::select(vec![60.0, 75.0, 100.0, 120.0, 144.0, 165.0, 240.0]),
            duration in 1.0f64..60.0,
            stimulus_count in 1usize..8,
        ) {
            if let Ok(plan) = quantize(frequency, refresh_rate, duration, stimulus_count) {
                let frames_per_stimulus =
                    (refresh_rate * duration / stimulus_count as f64).round_ties_even();
                let stimulus_duration = duration / stimulus_count as f64;

                let again = half_cycle_frames(frames_per_stimulus, plan.actual_frequency, stimulus_duration);
                prop_assert!((again - f64::from(plan.frames_per_half_cycle)).abs() < 1e-6);

                // Re-quantizing the corrected frequency lands on the same plan
                let replan = quantize(plan.actual_frequency, refresh_rate, duration, stimulus_count).unwrap();
                prop_assert_eq!(replan.frames_per_half_cycle, plan.frames_per_half_cycle);
            }
        }
    }
}

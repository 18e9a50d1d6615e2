//! Frame-to-signal pipeline.
//!
//! ```text
//! frame source → analyzer → rate converter → scalar series → CSV
//! ```
//!
//! One recording is processed at a time. Each run owns its converter
//! and analyzer state, so independent recordings can be driven from
//! separate threads by an outer driver.

mod batch;
mod series;

pub use batch::{run_batch, BatchSummary, ProcessedVideo, SkippedVideo};
pub use series::ScalarSeries;

use crate::analysis::{AnalysisError, FrameAnalyzer};
use crate::config::{AnalysisConfig, ConfigError};
use crate::source::{FrameSource, SourceError};
use crate::timing::RateConverter;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Errors that end processing of a recording.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Invalid run configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The recording could not be read.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// A frame could not be analysed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    /// Output could not be written.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// True for errors caused by the run configuration rather than a
    /// single recording.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ProcessError::Config(_))
    }
}

/// Outcome of processing one recording.
#[derive(Debug, Clone)]
pub struct VideoReport {
    /// Emitted samples.
    pub series: ScalarSeries,
    /// Frames read from the source, including skipped ones.
    pub frames_read: u64,
    /// Leading frames dropped.
    pub frames_skipped: u64,
    /// Frames that produced a scalar.
    pub frames_analyzed: u64,
    /// Extra samples inserted to correct drift.
    pub catch_up_samples: u64,
    /// Ideal minus emitted sample count at the last frame.
    pub final_drift: f64,
    /// The source failed mid-stream; the series covers the frames
    /// read before the failure.
    pub truncated: Option<String>,
    /// Reading stopped on request.
    pub cancelled: bool,
}

/// Processes one recording.
///
/// The `skip_starting_frames` leading frames are read and dropped
/// without advancing the converter. Frames for which the analyzer
/// yields no value emit nothing but still count as elapsed time, so a
/// motion series ends up as long as a luminance series of the same
/// recording. A read failure after the first frame, or a change in
/// frame size, truncates the recording; whatever was produced up to
/// that point is returned. Setting `cancel` stops reading at the next
/// frame boundary with the same effect.
pub fn process_video<S, A>(
    source: &mut S,
    analyzer: &mut A,
    config: &AnalysisConfig,
    cancel: &AtomicBool,
) -> Result<VideoReport, ProcessError>
where
    S: FrameSource + ?Sized,
    A: FrameAnalyzer + ?Sized,
{
    let fps = source.frame_rate();
    if !(fps.is_finite() && fps > 0.0) {
        return Err(SourceError::InvalidFrameRate(fps).into());
    }
    let mut converter = RateConverter::new(fps, config.sample_mode())?;
    analyzer.reset();

    let mut report = VideoReport {
        series: ScalarSeries::new(analyzer.kind()),
        frames_read: 0,
        frames_skipped: 0,
        frames_analyzed: 0,
        catch_up_samples: 0,
        final_drift: 0.0,
        truncated: None,
        cancelled: false,
    };

    loop {
        if cancel.load(Ordering::Relaxed) {
            report.cancelled = true;
            tracing::info!(frames = report.frames_read, "Stopped reading frames on request");
            break;
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) if report.frames_read == 0 => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, frames = report.frames_read, "Recording truncated");
                report.truncated = Some(e.to_string());
                break;
            }
        };
        report.frames_read += 1;

        if report.frames_read <= config.skip_starting_frames {
            report.frames_skipped += 1;
            continue;
        }

        let value = match analyzer.analyze(&frame) {
            Ok(Some(value)) => value,
            Ok(None) => {
                converter.skip_frame();
                continue;
            }
            Err(e @ AnalysisError::DimensionMismatch { .. }) => {
                tracing::warn!(error = %e, frames = report.frames_read, "Recording truncated");
                report.truncated = Some(e.to_string());
                break;
            }
            Err(e) => return Err(e.into()),
        };
        report.frames_analyzed += 1;

        let samples = converter.advance();
        report.series.push_repeated(value, samples);

        tracing::trace!(frame = frame.index(), value, samples, "Frame analysed");
    }

    report.catch_up_samples = converter.catch_up_total();
    report.final_drift = converter.drift();

    tracing::debug!(
        kind = %report.series.kind(),
        frames = report.frames_read,
        samples = report.series.len(),
        catch_up = report.catch_up_samples,
        drift = report.final_drift,
        "Recording processed"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{LuminanceAnalyzer, MotionAnalyzer};
    use crate::config::ExclusionConfig;
    use crate::source::{Frame, Pattern, SyntheticSource};

    fn not_cancelled() -> AtomicBool {
        AtomicBool::new(false)
    }

    /// Yields some frames, then fails.
    struct FailingSource {
        good: u64,
        read: u64,
    }

    impl FrameSource for FailingSource {
        fn frame_rate(&self) -> f64 {
            30.0
        }

        fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
            self.read += 1;
            if self.read > self.good {
                return Err(SourceError::ReadFailed {
                    index: self.read,
                    reason: "corrupt packet".into(),
                });
            }
            Ok(Some(Frame::solid(4, 4, [255; 3], self.read)))
        }
    }

    /// Switches frame size after three frames.
    struct ResizingSource {
        read: u64,
    }

    impl FrameSource for ResizingSource {
        fn frame_rate(&self) -> f64 {
            30.0
        }

        fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
            self.read += 1;
            let side = if self.read <= 3 { 4 } else { 8 };
            Ok((self.read <= 6).then(|| Frame::solid(side, side, [128; 3], self.read)))
        }
    }

    #[test]
    fn test_luminance_over_time() {
        let mut source = SyntheticSource::new(30.0, 8, 8, 3).with_pattern(Pattern::Solid([255; 3]));
        let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig::default());

        let report = process_video(
            &mut source,
            &mut analyzer,
            &AnalysisConfig::default(),
            &not_cancelled(),
        )
        .unwrap();

        assert_eq!(report.series.len(), 100);
        assert_eq!(report.catch_up_samples, 1);
        assert_eq!(report.frames_analyzed, 3);
        assert!(report.series.values().iter().all(|v| (v - 1.0).abs() < 1e-9));
    }

    #[test]
    fn test_per_frame_mode() {
        let mut source = SyntheticSource::new(30.0, 8, 8, 7);
        let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig::default());
        let config = AnalysisConfig {
            run_over_time: false,
            ..Default::default()
        };

        let report = process_video(&mut source, &mut analyzer, &config, &not_cancelled()).unwrap();
        assert_eq!(report.series.len(), 7);
    }

    #[test]
    fn test_skipped_frames_do_not_advance_clock() {
        let mut source = SyntheticSource::new(30.0, 8, 8, 5).with_pattern(Pattern::Flicker {
            on: [255; 3],
            off: [0; 3],
            half_period: 2,
        });
        let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig::default());
        let config = AnalysisConfig {
            skip_starting_frames: 2,
            ..Default::default()
        };

        let report = process_video(&mut source, &mut analyzer, &config, &not_cancelled()).unwrap();

        assert_eq!(report.frames_skipped, 2);
        assert_eq!(report.frames_analyzed, 3);
        assert_eq!(report.series.len(), 100);
        // Frames 3 and 4 are dark, frame 5 bright
        assert_eq!(report.series.values()[0], 0.0);
        assert!((report.series.values()[99] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_motion_priming_frame_counts_as_elapsed() {
        let mut source = SyntheticSource::new(30.0, 8, 8, 30);
        let mut analyzer = MotionAnalyzer::new(10.0, ExclusionConfig::default());

        let report = process_video(
            &mut source,
            &mut analyzer,
            &AnalysisConfig::default(),
            &not_cancelled(),
        )
        .unwrap();

        // 33 samples short after the first frame, one recovered per frame
        assert_eq!(report.frames_analyzed, 29);
        assert_eq!(report.series.len(), 986);
        assert!(report.catch_up_samples > 0);
    }

    #[test]
    fn test_motion_and_luminance_series_line_up() {
        let run = |analyzer: &mut dyn FrameAnalyzer| {
            let mut source = SyntheticSource::new(30.0, 8, 8, 300).with_pattern(Pattern::Flicker {
                on: [255; 3],
                off: [0; 3],
                half_period: 4,
            });
            process_video(
                &mut source,
                analyzer,
                &AnalysisConfig::default(),
                &not_cancelled(),
            )
            .unwrap()
        };

        let luminance = run(&mut LuminanceAnalyzer::new(ExclusionConfig::default()));
        let motion = run(&mut MotionAnalyzer::new(10.0, ExclusionConfig::default()));

        assert_eq!(luminance.series.len(), 10_000);
        assert_eq!(motion.series.len(), luminance.series.len());
        assert!(motion.final_drift >= 0.0 && motion.final_drift < 1.0);
    }

    #[test]
    fn test_frame_size_change_truncates() {
        let mut source = ResizingSource { read: 0 };
        let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig::default());

        let report = process_video(
            &mut source,
            &mut analyzer,
            &AnalysisConfig::default(),
            &not_cancelled(),
        )
        .unwrap();

        assert!(report.truncated.unwrap().contains("frame size changed"));
        assert_eq!(report.frames_analyzed, 3);
        assert_eq!(report.series.len(), 100);
    }

    #[test]
    fn test_truncated_source_keeps_partial_output() {
        let mut source = FailingSource { good: 3, read: 0 };
        let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig::default());

        let report = process_video(
            &mut source,
            &mut analyzer,
            &AnalysisConfig::default(),
            &not_cancelled(),
        )
        .unwrap();

        assert!(report.truncated.is_some());
        assert_eq!(report.series.len(), 100);
    }

    #[test]
    fn test_failure_on_first_frame_is_error() {
        let mut source = FailingSource { good: 0, read: 0 };
        let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig::default());

        let result = process_video(
            &mut source,
            &mut analyzer,
            &AnalysisConfig::default(),
            &not_cancelled(),
        );
        assert!(matches!(result, Err(ProcessError::Source(_))));
    }

    #[test]
    fn test_cancel_stops_reading() {
        let mut source = SyntheticSource::new(30.0, 8, 8, 10);
        let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig::default());

        let report = process_video(
            &mut source,
            &mut analyzer,
            &AnalysisConfig::default(),
            &AtomicBool::new(true),
        )
        .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.frames_read, 0);
        assert_eq!(source.remaining(), 10);
    }

    #[test]
    fn test_invalid_source_rate_rejected() {
        let mut source = SyntheticSource::new(0.0, 8, 8, 10);
        let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig::default());

        let result = process_video(
            &mut source,
            &mut analyzer,
            &AnalysisConfig::default(),
            &not_cancelled(),
        );
        assert!(matches!(
            result,
            Err(ProcessError::Source(SourceError::InvalidFrameRate(_)))
        ));
    }

    #[test]
    fn test_unsupported_resolution_is_analysis_error() {
        let mut source = SyntheticSource::new(30.0, 640, 480, 2);
        let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig {
            enabled: true,
            ..Default::default()
        });

        let result = process_video(
            &mut source,
            &mut analyzer,
            &AnalysisConfig::default(),
            &not_cancelled(),
        );
        assert!(matches!(
            result,
            Err(ProcessError::Analysis(AnalysisError::UnsupportedResolution { .. }))
        ));
    }
}

//! Entrainment Stimulus Toolkit
//!
//! Generates flicker stimuli at frequencies a display can actually
//! render, and extracts per-frame luminance and motion from recorded
//! stimulus videos, resampled to line up with an external fixed-rate
//! recording such as EEG.
//!
//! # Architecture
//!
//! ```text
//! generation:  config → timing::quantize → FlashPlan → frame sink
//! extraction:  frame source → analysis → timing::RateConverter → series → CSV
//! ```
//!
//! # Design Principles
//!
//! - **Whole frames only**: flicker phases snap to whole refresh frames;
//!   the corrected frequency is always reported, never silently applied
//! - **No drift**: resampled series stay within one sample of the ideal
//!   elapsed-time count for the whole recording
//! - **Per-recording failures are local**: a bad recording is skipped,
//!   the batch continues
//!
//! # Example
//!
//! ```no_run
//! use entrain_stim::{
//!     analysis::LuminanceAnalyzer,
//!     config::{AnalysisConfig, ExclusionConfig},
//!     pipeline::process_video,
//!     source::{Pattern, SyntheticSource},
//! };
//! use std::sync::atomic::AtomicBool;
//!
//! let mut source = SyntheticSource::new(30.0, 960, 540, 90)
//!     .with_pattern(Pattern::Flicker { on: [255; 3], off: [0; 3], half_period: 3 });
//! let mut analyzer = LuminanceAnalyzer::new(ExclusionConfig::default());
//!
//! let report = process_video(
//!     &mut source,
//!     &mut analyzer,
//!     &AnalysisConfig::default(),
//!     &AtomicBool::new(false),
//! )
//! .unwrap();
//!
//! // 3 seconds of video at 1000 Hz
//! assert_eq!(report.series.len(), 3000);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod config;
pub mod generation;
pub mod metrics;
pub mod pipeline;
pub mod source;
pub mod timing;

// Re-export commonly used types at crate root
pub use analysis::{FrameAnalyzer, LuminanceAnalyzer, MotionAnalyzer, SignalKind};
pub use config::{ConfigError, FileConfig};
pub use generation::{ConcatPlaylistSink, FrameSink, StimulusGenerator};
pub use pipeline::{process_video, run_batch, BatchSummary, ScalarSeries, VideoReport};
pub use source::{Frame, FrameSource, ImageSequenceSource, SyntheticSource};
pub use timing::{quantize, FlashPlan, RateConverter, SampleMode};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Prometheus metrics for extraction runs.
//!
//! # Metrics Exposed
//!
//! - `entrain_stim_frames_read_total` - Frames read from sources
//! - `entrain_stim_frames_skipped_total` - Leading frames dropped
//! - `entrain_stim_samples_emitted_total` - Samples written to series
//! - `entrain_stim_catch_up_samples_total` - Drift-correction samples inserted
//! - `entrain_stim_videos_processed_total` - Recordings processed
//! - `entrain_stim_videos_skipped_total` - Recordings skipped after an error
//! - `entrain_stim_last_drift_samples` - Drift at the end of the last recording
//!
//! # Example
//!
//! ```no_run
//! use entrain_stim::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! registry.record(&MetricsSnapshot {
//!     frames_read: 300,
//!     frames_skipped: 0,
//!     samples_emitted: 10_000,
//!     catch_up_samples: 100,
//!     final_drift: 0.0,
//! });
//!
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};

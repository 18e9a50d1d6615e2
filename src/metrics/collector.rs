//! Metrics collection and registry.

use crate::pipeline::VideoReport;
use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Per-recording totals to add to the registry.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Frames read, including skipped ones.
    pub frames_read: u64,
    /// Leading frames dropped.
    pub frames_skipped: u64,
    /// Samples emitted.
    pub samples_emitted: u64,
    /// Catch-up samples inserted.
    pub catch_up_samples: u64,
    /// Ideal minus emitted count at the last frame.
    pub final_drift: f64,
}

impl MetricsSnapshot {
    /// Creates a snapshot from a finished recording.
    pub fn from_report(report: &VideoReport) -> Self {
        Self {
            frames_read: report.frames_read,
            frames_skipped: report.frames_skipped,
            samples_emitted: report.series.len() as u64,
            catch_up_samples: report.catch_up_samples,
            final_drift: report.final_drift,
        }
    }
}

/// Prometheus metrics registry for extraction runs.
pub struct MetricsRegistry {
    registry: Registry,

    // Frame metrics
    frames_read: IntCounter,
    frames_skipped: IntCounter,

    // Conversion metrics
    samples_emitted: IntCounter,
    catch_up_samples: IntCounter,
    last_drift: Gauge,

    // Batch metrics
    videos_processed: IntCounter,
    videos_skipped: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all run metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_read = IntCounter::new(
            "entrain_stim_frames_read_total",
            "Total frames read from sources",
        )?;
        let frames_skipped = IntCounter::new(
            "entrain_stim_frames_skipped_total",
            "Total leading frames dropped",
        )?;
        let samples_emitted = IntCounter::new(
            "entrain_stim_samples_emitted_total",
            "Total samples written to scalar series",
        )?;
        let catch_up_samples = IntCounter::new(
            "entrain_stim_catch_up_samples_total",
            "Total drift-correction samples inserted",
        )?;
        let last_drift = Gauge::new(
            "entrain_stim_last_drift_samples",
            "Ideal minus emitted sample count at the end of the last recording",
        )?;
        let videos_processed = IntCounter::new(
            "entrain_stim_videos_processed_total",
            "Total recordings processed",
        )?;
        let videos_skipped = IntCounter::new(
            "entrain_stim_videos_skipped_total",
            "Total recordings skipped after an error",
        )?;

        registry.register(Box::new(frames_read.clone()))?;
        registry.register(Box::new(frames_skipped.clone()))?;
        registry.register(Box::new(samples_emitted.clone()))?;
        registry.register(Box::new(catch_up_samples.clone()))?;
        registry.register(Box::new(last_drift.clone()))?;
        registry.register(Box::new(videos_processed.clone()))?;
        registry.register(Box::new(videos_skipped.clone()))?;

        Ok(Self {
            registry,
            frames_read,
            frames_skipped,
            samples_emitted,
            catch_up_samples,
            last_drift,
            videos_processed,
            videos_skipped,
        })
    }

    /// Adds a processed recording's totals.
    pub fn record(&self, snapshot: &MetricsSnapshot) {
        self.frames_read.inc_by(snapshot.frames_read);
        self.frames_skipped.inc_by(snapshot.frames_skipped);
        self.samples_emitted.inc_by(snapshot.samples_emitted);
        self.catch_up_samples.inc_by(snapshot.catch_up_samples);
        self.last_drift.set(snapshot.final_drift);
        self.videos_processed.inc();
    }

    /// Counts a skipped recording.
    pub fn record_skip(&self) {
        self.videos_skipped.inc();
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_records_accumulate() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            frames_read: 30,
            frames_skipped: 1,
            samples_emitted: 967,
            catch_up_samples: 9,
            final_drift: 0.25,
        };
        registry.record(&snapshot);
        registry.record(&snapshot);
        registry.record_skip();

        let output = registry.encode().unwrap();
        assert!(output.contains("entrain_stim_frames_read_total 60"));
        assert!(output.contains("entrain_stim_samples_emitted_total 1934"));
        assert!(output.contains("entrain_stim_catch_up_samples_total 18"));
        assert!(output.contains("entrain_stim_videos_processed_total 2"));
        assert!(output.contains("entrain_stim_videos_skipped_total 1"));
        assert!(output.contains("entrain_stim_last_drift_samples 0.25"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("entrain_stim_frames_read_total"));
        assert!(output.contains("entrain_stim_videos_skipped_total"));
    }
}

//! Batch driver over many recordings.
//!
//! A failure in one recording never aborts the batch: the recording is
//! skipped and listed in the summary. Only configuration errors, which
//! would fail every recording the same way, end the run early.

use super::{process_video, ProcessError};
use crate::analysis::{analyzer_for, SignalKind};
use crate::config::FileConfig;
use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use crate::source::{FrameSource, SourceError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// A recording that produced output.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedVideo {
    /// Recording name used for outputs.
    pub name: String,
    /// Frames read, including skipped ones.
    pub frames_read: u64,
    /// Samples written.
    pub samples: u64,
    /// Drift-correction samples among them.
    pub catch_up_samples: u64,
    /// Reading stopped on request.
    pub cancelled: bool,
    /// Written table, if any samples were emitted.
    pub output: Option<PathBuf>,
    /// Error that cut the recording short.
    pub truncated: Option<String>,
}

/// A recording that was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedVideo {
    /// Recording name.
    pub name: String,
    /// Error that caused the skip.
    pub reason: String,
}

/// Result of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Signal extracted.
    pub kind: SignalKind,
    /// When the batch started.
    pub started_at: DateTime<Utc>,
    /// When the batch ended.
    pub finished_at: DateTime<Utc>,
    /// The batch stopped early on request.
    pub cancelled: bool,
    /// Recordings with output, in input order.
    pub processed: Vec<ProcessedVideo>,
    /// Recordings skipped after an error.
    pub skipped: Vec<SkippedVideo>,
}

impl BatchSummary {
    fn new(kind: SignalKind) -> Self {
        let now = Utc::now();
        Self {
            kind,
            started_at: now,
            finished_at: now,
            cancelled: false,
            processed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Serializes the summary as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// Logs the end-of-run report.
    pub fn log(&self) {
        for skipped in &self.skipped {
            tracing::warn!(video = %skipped.name, reason = %skipped.reason, "Skipped");
        }
        tracing::info!(
            kind = %self.kind,
            processed = self.processed.len(),
            skipped = self.skipped.len(),
            cancelled = self.cancelled,
            elapsed_ms = (self.finished_at - self.started_at).num_milliseconds(),
            "Batch finished"
        );
    }
}

/// Name used for a recording's outputs.
fn recording_name(input: &Path, position: usize) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("recording_{position}"))
}

/// Extracts `kind` from every input in order.
///
/// `open` turns an input path into a frame source. Tables are written to
/// `output_dir` as `<name>_<kind>.csv`, replacing existing files; the
/// directory is created if needed. Recordings that emit no samples
/// produce no table.
pub fn run_batch<F>(
    inputs: &[PathBuf],
    kind: SignalKind,
    config: &FileConfig,
    output_dir: &Path,
    mut open: F,
    metrics: Option<&MetricsRegistry>,
    cancel: &AtomicBool,
) -> Result<BatchSummary, ProcessError>
where
    F: FnMut(&Path) -> Result<Box<dyn FrameSource>, SourceError>,
{
    std::fs::create_dir_all(output_dir)?;

    let mut summary = BatchSummary::new(kind);
    let skip = |summary: &mut BatchSummary, name: String, reason: String| {
        tracing::warn!(video = %name, %reason, "Skipping recording");
        if let Some(metrics) = metrics {
            metrics.record_skip();
        }
        summary.skipped.push(SkippedVideo { name, reason });
    };

    for (position, input) in inputs.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            summary.cancelled = true;
            break;
        }

        let name = recording_name(input, position);
        tracing::info!(video = %name, "Processing recording");

        let mut source = match open(input) {
            Ok(source) => source,
            Err(e) => {
                skip(&mut summary, name, e.to_string());
                continue;
            }
        };

        let mut analyzer = analyzer_for(kind, &config.analysis, &config.exclusions);
        let report = match process_video(
            source.as_mut(),
            analyzer.as_mut(),
            &config.analysis,
            cancel,
        ) {
            Ok(report) => report,
            Err(e) if e.is_configuration() => return Err(e),
            Err(e) => {
                skip(&mut summary, name, e.to_string());
                continue;
            }
        };

        let output = if report.series.is_empty() {
            tracing::warn!(video = %name, "No samples emitted");
            None
        } else {
            let path = output_dir.join(format!("{}_{}.csv", name, kind.file_suffix()));
            if let Err(e) = report.series.save_csv(&path) {
                skip(&mut summary, name, format!("{}: {}", path.display(), e));
                continue;
            }
            Some(path)
        };

        if let Some(metrics) = metrics {
            metrics.record(&MetricsSnapshot::from_report(&report));
        }

        tracing::info!(
            video = %name,
            samples = report.series.len(),
            catch_up = report.catch_up_samples,
            "Recording done"
        );

        summary.processed.push(ProcessedVideo {
            name,
            frames_read: report.frames_read,
            samples: report.series.len() as u64,
            catch_up_samples: report.catch_up_samples,
            cancelled: report.cancelled,
            output,
            truncated: report.truncated,
        });

        if report.cancelled {
            summary.cancelled = true;
            break;
        }
    }

    summary.finished_at = Utc::now();
    Ok(summary)
}

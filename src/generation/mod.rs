//! Flicker stimulus generation.
//!
//! Each stimulus image is shown for an equal share of the clip as a
//! square-wave flicker: image, black, image, black, ... with every
//! phase lasting a whole number of refresh frames. The frequency is
//! quantized first; the sink is then called once per flash.

mod playlist;
mod sink;

pub use playlist::ConcatPlaylistSink;
pub use sink::{FlashContent, FrameSink, MemorySink, RecordedFlash, SinkError};

use crate::config::{ConfigError, GenerationConfig};
use crate::timing::{quantize, FlashPlan};
use image::{imageops, RgbImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while generating a stimulus clip.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Settings cannot produce a clip.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The sink failed.
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// A stimulus image could not be decoded.
    #[error("failed to load stimulus {path}: {source}")]
    Load {
        /// Image path.
        path: PathBuf,
        /// Decoder error.
        source: image::ImageError,
    },
}

/// Outcome of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Timing the clip was rendered with.
    pub plan: FlashPlan,
    /// Flashes handed to the sink.
    pub flashes: usize,
    /// Where the sink wrote the clip.
    pub output: PathBuf,
}

/// Loads stimulus images in the given order.
pub fn load_stimuli(paths: &[PathBuf]) -> Result<Vec<RgbImage>, GenerationError> {
    paths
        .iter()
        .map(|path| {
            image::open(path)
                .map(|img| img.to_rgb8())
                .map_err(|source| GenerationError::Load {
                    path: path.clone(),
                    source,
                })
        })
        .collect()
}

/// Centres `image` on a black canvas, cropping anything that overhangs.
pub fn compose_on_canvas(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let mut canvas = RgbImage::new(width, height);
    let x = (i64::from(width) - i64::from(image.width())) / 2;
    let y = (i64::from(height) - i64::from(image.height())) / 2;
    imageops::overlay(&mut canvas, image, x, y);
    canvas
}

/// Renders flicker clips from still images.
#[derive(Debug, Clone)]
pub struct StimulusGenerator {
    config: GenerationConfig,
}

impl StimulusGenerator {
    /// Creates a generator for the given settings.
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    /// Computes the flash plan for `stimulus_count` images.
    pub fn plan(&self, stimulus_count: usize) -> Result<FlashPlan, ConfigError> {
        quantize(
            self.config.requested_frequency,
            self.config.refresh_rate,
            self.config.duration,
            stimulus_count,
        )
    }

    /// Renders `images` into `sink`, one flash per call.
    pub fn render<S: FrameSink + ?Sized>(
        &self,
        images: &[RgbImage],
        sink: &mut S,
    ) -> Result<GenerationReport, GenerationError> {
        let plan = self.plan(images.len())?;
        let (width, height) = (self.config.screen_width, self.config.screen_height);

        if let Some(adjustment) = plan.frequency_adjustment() {
            tracing::info!(
                requested_hz = adjustment.requested,
                actual_hz = adjustment.actual,
                "Rendering at corrected frequency"
            );
        }
        if plan.overrun_seconds() > 1e-9 {
            tracing::info!(
                overrun_seconds = plan.overrun_seconds(),
                "Whole cycles run past the requested duration"
            );
        }

        sink.begin(plan.refresh_rate, width, height)?;

        let mut flashes = 0;
        for (index, image) in images.iter().enumerate() {
            let canvas = compose_on_canvas(image, width, height);
            for _ in 0..plan.cycles_per_stimulus {
                sink.write_flash(
                    FlashContent::Image {
                        index,
                        image: &canvas,
                    },
                    plan.flash_duration_seconds,
                )?;
                sink.write_flash(FlashContent::Blank, plan.flash_duration_seconds)?;
                flashes += 2;
            }
        }

        let output = sink.finish()?;

        tracing::info!(
            output = %output.display(),
            frequency_hz = plan.actual_frequency,
            frames_per_half_cycle = plan.frames_per_half_cycle,
            total_duration_seconds = plan.total_duration_seconds(),
            "Stimulus clip created"
        );

        Ok(GenerationReport {
            plan,
            flashes,
            output,
        })
    }

    /// Loads images from disk and renders them into `sink`.
    pub fn render_files<S: FrameSink + ?Sized>(
        &self,
        paths: &[PathBuf],
        sink: &mut S,
    ) -> Result<GenerationReport, GenerationError> {
        // Reject impossible settings before decoding anything.
        self.plan(paths.len())?;
        let images = load_stimuli(paths)?;
        self.render(&images, sink)
    }
}

/// Default clip name for an output directory.
pub fn clip_name(output_dir: &Path) -> String {
    output_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stimulus".to_string())
}

//! Concat-playlist sink.
//!
//! Writes each distinct screen (every stimulus image and the black
//! frame) once as PNG, plus an `ffconcat` playlist that lists the
//! flashes in order with their durations. Any concat-capable encoder
//! can turn the playlist into a video at the display's refresh rate.

use super::sink::{FlashContent, FrameSink, SinkError};
use image::RgbImage;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Writes a stimulus clip as stills plus an `ffconcat` playlist.
///
/// Existing files with the same names are overwritten.
#[derive(Debug)]
pub struct ConcatPlaylistSink {
    dir: PathBuf,
    name: String,
    format: Option<(f64, u32, u32)>,
    /// `(file name, duration)` per flash.
    entries: Vec<(String, f64)>,
    written: HashSet<String>,
}

impl ConcatPlaylistSink {
    /// Creates a sink writing `<name>.ffconcat` and its stills to `dir`.
    pub fn new(dir: impl AsRef<Path>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            name: name.into(),
            format: None,
            entries: Vec::new(),
            written: HashSet::new(),
        }
    }

    /// Returns the playlist path.
    pub fn playlist_path(&self) -> PathBuf {
        self.dir.join(format!("{}.ffconcat", self.name))
    }

    fn still(&mut self, file: String, image: &RgbImage) -> Result<String, SinkError> {
        if !self.written.contains(&file) {
            image.save(self.dir.join(&file))?;
            self.written.insert(file.clone());
        }
        Ok(file)
    }
}

impl FrameSink for ConcatPlaylistSink {
    fn begin(&mut self, frame_rate: f64, width: u32, height: u32) -> Result<(), SinkError> {
        std::fs::create_dir_all(&self.dir)?;
        self.format = Some((frame_rate, width, height));
        self.entries.clear();
        self.written.clear();
        Ok(())
    }

    fn write_flash(
        &mut self,
        content: FlashContent<'_>,
        duration_seconds: f64,
    ) -> Result<(), SinkError> {
        let (_, width, height) = self.format.ok_or(SinkError::NotStarted)?;

        let file = match content {
            FlashContent::Image { index, image } => {
                self.still(format!("{}_stimulus_{:03}.png", self.name, index), image)?
            }
            FlashContent::Blank => {
                let file = format!("{}_blank.png", self.name);
                if self.written.contains(&file) {
                    file
                } else {
                    self.still(file, &RgbImage::new(width, height))?
                }
            }
        };

        self.entries.push((file, duration_seconds));
        Ok(())
    }

    fn finish(&mut self) -> Result<PathBuf, SinkError> {
        let (frame_rate, _, _) = self.format.ok_or(SinkError::NotStarted)?;

        let mut text = String::from("ffconcat version 1.0\n");
        let _ = writeln!(text, "# frame_rate {}", frame_rate);
        for (file, duration) in &self.entries {
            let _ = writeln!(text, "file '{}'\nduration {:.6}", file, duration);
        }
        // The concat demuxer ignores the duration of the final entry
        // unless the file is listed once more.
        if let Some((file, _)) = self.entries.last() {
            let _ = writeln!(text, "file '{}'", file);
        }

        let path = self.playlist_path();
        std::fs::write(&path, text)?;
        tracing::info!(
            playlist = %path.display(),
            flashes = self.entries.len(),
            stills = self.written.len(),
            "Stimulus playlist written"
        );
        Ok(path)
    }
}

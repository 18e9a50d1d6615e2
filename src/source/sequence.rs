//! Image-sequence frame source.
//!
//! Reads a recording that has been exported as one still image per
//! frame into a single directory. Frames are ordered by file name.

use super::{Frame, FrameSource, SourceError};
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            FRAME_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Frame source over a directory of still frames.
#[derive(Debug)]
pub struct ImageSequenceSource {
    frames: Vec<PathBuf>,
    frame_rate: f64,
    next: usize,
}

impl ImageSequenceSource {
    /// Opens the directory and lists its frames.
    ///
    /// The frame rate is not stored in still images, so the caller
    /// supplies the rate the sequence was exported at.
    pub fn open(dir: impl AsRef<Path>, frame_rate: f64) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| SourceError::Unavailable(format!("{}: {}", dir.display(), e)))?;

        let mut frames = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| SourceError::Unavailable(format!("{}: {}", dir.display(), e)))?
                .path();
            if path.is_file() && is_frame_file(&path) {
                frames.push(path);
            }
        }

        if frames.is_empty() {
            return Err(SourceError::Unavailable(format!(
                "{}: no frame images found",
                dir.display()
            )));
        }
        frames.sort();

        tracing::debug!(
            dir = %dir.display(),
            frames = frames.len(),
            frame_rate,
            "Opened image sequence"
        );

        Ok(Self {
            frames,
            frame_rate,
            next: 0,
        })
    }

    /// Returns the number of frames in the sequence.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if the sequence has no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let Some(path) = self.frames.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        let index = self.next as u64;

        let image = image::open(path).map_err(|e| SourceError::ReadFailed {
            index,
            reason: format!("{}: {}", path.display(), e),
        })?;

        Ok(Some(Frame::new(image.to_rgb8(), index)))
    }
}

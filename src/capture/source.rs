//! Frame sources the capture session polls.

use anyhow::{anyhow, Context, Result};
use image::{ImageBuffer, Rgba};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::CaptureError;

/// Something that yields screen frames on demand.
///
/// The capture session owns its source exclusively: `open` before the first
/// frame, `close` after the last one.
pub trait FrameSource: Send {
    /// Acquires the device. Fails with `PermissionDenied` or `DeviceUnavailable`.
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Grabs the current frame.
    fn next_frame(&mut self) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>>;

    /// Releases the device. Safe to call when not open.
    fn close(&mut self);
}

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Replays saved screenshots from a directory, in file name order.
///
/// Wraps around to the first file after the last one, so a session can keep
/// polling a short recording.
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
}

impl ImageSequenceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            next: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn open(&mut self) -> Result<(), CaptureError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => {
                CaptureError::PermissionDenied(format!("{}: {}", self.dir.display(), e))
            }
            _ => CaptureError::DeviceUnavailable(format!("{}: {}", self.dir.display(), e)),
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_image_file(path))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(CaptureError::DeviceUnavailable(format!(
                "no images in {}",
                self.dir.display()
            )));
        }

        crate::log(&format!(
            "Replaying {} frames from {}",
            files.len(),
            self.dir.display()
        ));
        self.files = files;
        self.next = 0;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
        if self.files.is_empty() {
            return Err(anyhow!("Image sequence is not open"));
        }

        let path = &self.files[self.next];
        self.next = (self.next + 1) % self.files.len();

        let img = image::open(path)
            .with_context(|| format!("Failed to load frame {}", path.display()))?;
        Ok(img.to_rgba8())
    }

    fn close(&mut self) {
        self.files.clear();
        self.next = 0;
    }
}

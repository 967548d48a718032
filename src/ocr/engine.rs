use anyhow::{anyhow, Result};
use image::{DynamicImage, ImageBuffer, Luma, Rgba};
use std::fmt;
use std::process::Command;
use std::sync::Arc;
use tempfile::NamedTempFile;

use super::preprocess::threshold_bright_pixels;
use super::setup::TesseractPaths;
use crate::config::OcrConfig;
use crate::error::CaptureError;

/// Axis-aligned box in the coordinate space of the image that was recognised.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox {
            left,
            top,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    }
}

/// One line of recognised text and where it was found.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognizedTextBox {
    pub text: String,
    pub bounds: BoundingBox,
    /// Mean word confidence, 0-100
    pub confidence: f32,
}

/// A text recognition backend.
///
/// `detect` may block; it is the only call in a detection tick that waits on
/// something outside the process.
pub trait TextRecognizer: Send + Sync {
    fn detect(&self, img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Result<Vec<RecognizedTextBox>>;
}

/// Whether this host can recognise text at all, probed once at startup.
#[derive(Clone)]
pub enum Recognition {
    Available(Arc<dyn TextRecognizer>),
    Absent { reason: String },
}

impl Recognition {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Returns the recognizer, or `CapabilityAbsent` with the probe's reason.
    pub fn recognizer(&self) -> Result<Arc<dyn TextRecognizer>, CaptureError> {
        match self {
            Self::Available(r) => Ok(Arc::clone(r)),
            Self::Absent { reason } => Err(CaptureError::CapabilityAbsent(reason.clone())),
        }
    }
}

impl fmt::Debug for Recognition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(_) => write!(f, "Recognition::Available"),
            Self::Absent { reason } => write!(f, "Recognition::Absent({})", reason),
        }
    }
}

/// Recognizes text by running the Tesseract CLI with TSV output.
pub struct TesseractRecognizer {
    paths: TesseractPaths,
    config: OcrConfig,
}

impl TesseractRecognizer {
    pub fn new(paths: TesseractPaths, config: OcrConfig) -> Self {
        Self { paths, config }
    }

    fn prepare(&self, img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> ImageBuffer<Luma<u8>, Vec<u8>> {
        match self.config.threshold {
            Some(threshold) => threshold_bright_pixels(img, threshold),
            None => DynamicImage::ImageRgba8(img.clone()).to_luma8(),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn detect(&self, img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Result<Vec<RecognizedTextBox>> {
        if img.width() == 0 || img.height() == 0 {
            return Ok(Vec::new());
        }

        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        self.prepare(img).save(temp_input.path())?;

        // Tesseract adds the .tsv extension itself
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        let mut command = Command::new(&self.paths.executable);
        command.arg(temp_input.path()).arg(&output_base);
        if let Some(tessdata) = &self.paths.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        let output = command
            .arg("-l")
            .arg(&self.config.language)
            .arg("--psm")
            .arg(self.config.page_segmentation.to_string())
            .arg("tsv")
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;
        let _ = std::fs::remove_file(&tsv_path);

        parse_tsv_output(&tsv_content)
    }
}

struct LineAccumulator {
    key: (i32, i32, i32),
    words: Vec<String>,
    bounds: BoundingBox,
    conf_sum: f32,
}

impl LineAccumulator {
    fn finish(self) -> RecognizedTextBox {
        let count = self.words.len().max(1) as f32;
        RecognizedTextBox {
            text: self.words.join(" "),
            bounds: self.bounds,
            confidence: self.conf_sum / count,
        }
    }
}

/// Parses Tesseract TSV output into one box per text line.
///
/// Word rows (level 5) sharing a block, paragraph and line number are joined
/// with spaces; the line box is the union of its word boxes.
pub fn parse_tsv_output(tsv: &str) -> Result<Vec<RecognizedTextBox>> {
    let mut lines = Vec::new();
    let mut current: Option<LineAccumulator> = None;

    for row in tsv.lines().skip(1) {
        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let text = fields[11].trim();
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let key = (
            fields[2].parse().unwrap_or(-1),
            fields[3].parse().unwrap_or(-1),
            fields[4].parse().unwrap_or(-1),
        );
        let bounds = BoundingBox {
            left: fields[6].parse().unwrap_or(0),
            top: fields[7].parse().unwrap_or(0),
            width: fields[8].parse().unwrap_or(0),
            height: fields[9].parse().unwrap_or(0),
        };

        match current.as_mut() {
            Some(line) if line.key == key => {
                line.words.push(text.to_string());
                line.bounds = line.bounds.union(&bounds);
                line.conf_sum += conf;
            }
            _ => {
                if let Some(done) = current.take() {
                    lines.push(done.finish());
                }
                current = Some(LineAccumulator {
                    key,
                    words: vec![text.to_string()],
                    bounds,
                    conf_sum: conf,
                });
            }
        }
    }

    if let Some(done) = current {
        lines.push(done.finish());
    }

    Ok(lines)
}

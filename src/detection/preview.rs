//! Preview surfaces for intermediate crops.
//!
//! The portal panel is always presented. The other stages are only presented
//! while debug mode is on, so the regions can be checked by eye.

use anyhow::Result;
use image::{ImageBuffer, Rgba};
use std::fs;
use std::path::PathBuf;

use crate::config::PixelRect;

pub const COLOR_MAP_REGION: Rgba<u8> = Rgba([0, 255, 0, 255]); // Green
pub const COLOR_ZONE_REGION: Rgba<u8> = Rgba([0, 0, 255, 255]); // Blue
pub const COLOR_PANEL_REGION: Rgba<u8> = Rgba([255, 128, 0, 255]); // Orange
pub const COLOR_SWATCH_REGION: Rgba<u8> = Rgba([255, 255, 0, 255]); // Yellow

/// Pipeline stage an image belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PreviewStage {
    /// Normalized frame with the extracted regions outlined
    Scaled,
    Map,
    CurrentZone,
    SizeSwatch,
    PortalPanel,
}

impl PreviewStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Scaled => "scaled",
            Self::Map => "map",
            Self::CurrentZone => "current_zone",
            Self::SizeSwatch => "size_swatch",
            Self::PortalPanel => "portal_panel",
        }
    }

    /// Stages shown regardless of debug mode.
    pub fn always_shown(self) -> bool {
        matches!(self, Self::PortalPanel)
    }
}

/// Somewhere to put intermediate crops.
pub trait PreviewSurface: Send {
    fn show(&mut self, stage: PreviewStage, img: &ImageBuffer<Rgba<u8>, Vec<u8>>);
}

/// Writes each stage to `<dir>/<stage>.png`, overwriting the previous tick.
pub struct DirectoryPreview {
    dir: PathBuf,
}

impl DirectoryPreview {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, stage: PreviewStage) -> PathBuf {
        self.dir.join(format!("{}.png", stage.name()))
    }
}

impl PreviewSurface for DirectoryPreview {
    fn show(&mut self, stage: PreviewStage, img: &ImageBuffer<Rgba<u8>, Vec<u8>>) {
        let path = self.path_for(stage);
        if let Err(e) = img.save(&path) {
            crate::log(&format!("Failed to save preview {}: {}", path.display(), e));
        }
    }
}

/// Outlines a region on a frame. Parts outside the image are skipped.
pub fn draw_region(
    img: &mut ImageBuffer<Rgba<u8>, Vec<u8>>,
    rect: &PixelRect,
    color: Rgba<u8>,
    thickness: u32,
) {
    let (img_w, img_h) = img.dimensions();
    let (img_w, img_h) = (img_w as i64, img_h as i64);
    let x0 = rect.x as i64;
    let y0 = rect.y as i64;
    let x1 = x0 + rect.width as i64;
    let y1 = y0 + rect.height as i64;
    let t = thickness as i64;

    for py in y0.max(0)..y1.min(img_h) {
        for px in x0.max(0)..x1.min(img_w) {
            let on_edge = px < x0 + t || px >= x1 - t || py < y0 + t || py >= y1 - t;
            if on_edge {
                img.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

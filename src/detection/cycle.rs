//! One detection tick over a captured frame.
//!
//! The tick normalizes the frame, finds the landmark in the map crop, cuts
//! the portal panel and size swatch relative to it, reads the current zone
//! label, and assembles a `DetectionCandidate`. The candidate is committed to
//! the result sink only when every field is known.
//!
//! Text recognition is the only call in a tick that blocks on an external
//! process. A missing landmark ends the tick before any other region is read.

use anyhow::Result;
use image::{ImageBuffer, Rgba};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::anchor::find_anchor;
use super::candidate::DetectionCandidate;
use super::color::{classify_size, mean_color, PortalSize};
use super::preview::{
    draw_region, PreviewStage, PreviewSurface, COLOR_MAP_REGION, COLOR_PANEL_REGION,
    COLOR_SWATCH_REGION, COLOR_ZONE_REGION,
};
use super::sink::ResultSink;
use crate::catalog::{find_zone_or_default, match_zone, Zone};
use crate::config::{CaptureConfig, PixelRect};
use crate::error::CaptureError;
use crate::ocr::extract::extract_timer;
use crate::ocr::preprocess::{clamp_rect, crop_rect, fit_to, normalize_frame};
use crate::ocr::{RecognizedTextBox, TextRecognizer};

/// What a tick ended with.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// No landmark in the map crop; nothing else was read.
    AnchorNotFound,
    /// Some field is still unknown; nothing was committed.
    Incomplete(DetectionCandidate),
    /// All fields known and pushed to the sink.
    Committed(DetectionCandidate),
    /// All fields known, but the session stopped while the tick ran.
    Discarded(DetectionCandidate),
    /// Recognition failed; the next tick starts over.
    Failed(String),
}

/// Runs detection ticks against one configuration and catalog.
pub struct DetectionCycle {
    config: CaptureConfig,
    zones: Vec<Zone>,
    recognizer: Arc<dyn TextRecognizer>,
    preview: Option<Box<dyn PreviewSurface>>,
    debug: Arc<AtomicBool>,
}

impl DetectionCycle {
    /// Fails with `InvalidArgument` when the catalog is empty, since no
    /// recognised name could ever be matched.
    pub fn new(
        config: CaptureConfig,
        zones: Vec<Zone>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Result<Self, CaptureError> {
        if zones.is_empty() {
            return Err(CaptureError::InvalidArgument(
                "zone catalog is empty".to_string(),
            ));
        }

        Ok(Self {
            config,
            zones,
            recognizer,
            preview: None,
            debug: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_preview(mut self, preview: Box<dyn PreviewSurface>) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Shares an existing debug toggle instead of the cycle's own.
    pub fn with_debug(mut self, debug: Arc<AtomicBool>) -> Self {
        self.debug = debug;
        self
    }

    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::SeqCst);
    }

    /// Shared debug toggle, for flipping it while the cycle runs on another thread.
    pub fn debug_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.debug)
    }

    /// Reads one frame. Returns `None` when the landmark is not on screen.
    pub fn detect(
        &mut self,
        frame: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    ) -> Result<Option<DetectionCandidate>> {
        let config = &self.config;
        let scaled = normalize_frame(frame, config.canonical_width, config.canonical_height);

        // Landmark
        let map = crop_rect(&scaled, &config.map_region);
        let map_boxes = self.recognizer.detect(&map)?;
        let debug = self.debug.load(Ordering::SeqCst);
        let anchor = match find_anchor(&map_boxes, &config.anchor_label) {
            Ok(anchor) => anchor,
            Err(CaptureError::AnchorNotFound(_)) => {
                if debug {
                    let annotated = annotate_fixed_regions(&scaled, config);
                    present(&mut self.preview, debug, PreviewStage::Map, &map);
                    present(&mut self.preview, debug, PreviewStage::Scaled, &annotated);
                }
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let (left, top) = (anchor.bounds.left, anchor.bounds.top);

        // Anchor-relative crops, in map coordinates
        let panel_rect = config.portal_panel.resolve(left, top);
        let swatch_rect = config.size_swatch.resolve(left, top);
        let (panel_w, panel_h) = config.portal_panel_size;
        let panel = fit_to(crop_rect(&map, &panel_rect), panel_w, panel_h);
        let swatch = crop_rect(&map, &swatch_rect);

        let size = mean_color(&swatch)
            .map(|color| classify_size(color, &config.size_references))
            .unwrap_or(PortalSize::None);

        let destination_boxes = self
            .recognizer
            .detect(&crop_rect(&panel, &config.destination_region))?;
        let destination = self.last_match(
            &destination_boxes,
            config.destination_max_distance,
            &[],
        );

        let timer_rect = clamp_rect(&config.timer_region, panel_w, panel_h);
        let timer_boxes = self.recognizer.detect(&crop_rect(&panel, &timer_rect))?;
        let duration = extract_timer(timer_boxes.iter().map(|b| b.text.as_str()))
            .unwrap_or_default();

        // Current location, independent of the landmark
        let zone_crop = crop_rect(&scaled, &config.current_zone_region);
        let zone_boxes = self.recognizer.detect(&zone_crop)?;
        let origin = self.last_match(
            &zone_boxes,
            config.origin_max_distance,
            &config.excluded_prefixes,
        );

        let preview = &mut self.preview;
        present(preview, debug, PreviewStage::PortalPanel, &panel);
        if debug {
            let (map_x, map_y) = (config.map_region.x, config.map_region.y);
            let offset = |r: PixelRect| PixelRect::new(r.x + map_x, r.y + map_y, r.width, r.height);
            let mut annotated = annotate_fixed_regions(&scaled, config);
            draw_region(&mut annotated, &offset(panel_rect), COLOR_PANEL_REGION, 4);
            draw_region(&mut annotated, &offset(swatch_rect), COLOR_SWATCH_REGION, 2);

            present(preview, debug, PreviewStage::Map, &map);
            present(preview, debug, PreviewStage::CurrentZone, &zone_crop);
            present(preview, debug, PreviewStage::SizeSwatch, &swatch);
            present(preview, debug, PreviewStage::Scaled, &annotated);
        }

        Ok(Some(DetectionCandidate {
            origin: origin.unwrap_or_default(),
            destination: destination.unwrap_or_default(),
            duration,
            size,
        }))
    }

    /// Runs `detect` and commits the result when it is complete and the
    /// session has not been cancelled in the meantime.
    pub fn run_tick(
        &mut self,
        frame: &ImageBuffer<Rgba<u8>, Vec<u8>>,
        sink: &mut dyn ResultSink,
        cancelled: &AtomicBool,
    ) -> TickOutcome {
        let candidate = match self.detect(frame) {
            Ok(Some(candidate)) => candidate,
            Ok(None) => return TickOutcome::AnchorNotFound,
            Err(e) => {
                crate::log(&format!("Detection tick failed: {:#}", e));
                return TickOutcome::Failed(e.to_string());
            }
        };

        if !candidate.is_committable() {
            if self.debug.load(Ordering::SeqCst) {
                crate::log(&format!("Incomplete detection: {:?}", candidate));
            }
            return TickOutcome::Incomplete(candidate);
        }

        if cancelled.load(Ordering::SeqCst) {
            crate::log("Session stopped during tick, detection discarded");
            return TickOutcome::Discarded(candidate);
        }

        self.commit(&candidate, sink);
        crate::log(&candidate.status_line());
        TickOutcome::Committed(candidate)
    }

    fn commit(&self, candidate: &DetectionCandidate, sink: &mut dyn ResultSink) {
        let origin = find_zone_or_default(&self.zones, &candidate.origin);
        let destination = find_zone_or_default(&self.zones, &candidate.destination);

        sink.set_origin(&origin);
        sink.set_destination(&destination);
        sink.set_portal_size(candidate.size);
        sink.set_hours(candidate.duration.hours);
        sink.set_minutes(candidate.duration.minutes);
    }

    /// Zone name for the last box that matches; earlier matches are overwritten.
    fn last_match(
        &self,
        boxes: &[RecognizedTextBox],
        max_distance: Option<usize>,
        excluded_prefixes: &[String],
    ) -> Option<String> {
        boxes
            .iter()
            .filter_map(|b| {
                match_zone(&b.text, &self.zones, max_distance, excluded_prefixes)
                    .ok()
                    .map(|m| m.zone.display_name().to_string())
            })
            .last()
    }
}

/// Copy of the normalized frame with the map and current-zone regions outlined.
fn annotate_fixed_regions(
    scaled: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    config: &CaptureConfig,
) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    let mut annotated = scaled.clone();
    draw_region(&mut annotated, &config.map_region, COLOR_MAP_REGION, 4);
    draw_region(&mut annotated, &config.current_zone_region, COLOR_ZONE_REGION, 4);
    annotated
}

fn present(
    preview: &mut Option<Box<dyn PreviewSurface>>,
    debug: bool,
    stage: PreviewStage,
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
) {
    if !stage.always_shown() && !debug {
        return;
    }
    if let Some(preview) = preview.as_mut() {
        preview.show(stage, img);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::ocr::BoundingBox;
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Map crop size with the default config.
    pub const MAP: (u32, u32) = (1040, 670);
    pub const ZONE: (u32, u32) = (270, 60);
    pub const DESTINATION: (u32, u32) = (400, 50);
    pub const TIMER: (u32, u32) = (310, 100);

    /// Landmark position in the map crop used by `road_frame`.
    pub const ANCHOR: (i32, i32) = (400, 300);

    pub fn text_box(text: &str, left: i32, top: i32) -> RecognizedTextBox {
        RecognizedTextBox {
            text: text.to_string(),
            bounds: BoundingBox { left, top, width: 210, height: 26 },
            confidence: 90.0,
        }
    }

    /// Answers by crop size, which identifies the region with the default config.
    #[derive(Default)]
    pub struct ScriptedRecognizer {
        pub answers: HashMap<(u32, u32), Vec<RecognizedTextBox>>,
        pub requests: Mutex<Vec<(u32, u32)>>,
        pub fail: bool,
    }

    impl ScriptedRecognizer {
        pub fn answer(mut self, region: (u32, u32), texts: &[&str]) -> Self {
            let boxes = texts.iter().map(|t| text_box(t, 0, 0)).collect();
            self.answers.insert(region, boxes);
            self
        }

        /// A full road: landmark, destination, timer and current zone.
        pub fn road() -> Self {
            let mut recognizer = Self::default()
                .answer(DESTINATION, &["Hasitos-Umayaum"])
                .answer(TIMER, &["3h 12m"])
                .answer(ZONE, &["Sectun-Qinsom"]);
            recognizer
                .answers
                .insert(MAP, vec![text_box("Road of Avalon", ANCHOR.0, ANCHOR.1)]);
            recognizer
        }

        pub fn requests(&self) -> Vec<(u32, u32)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn detect(&self, img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Result<Vec<RecognizedTextBox>> {
            self.requests.lock().unwrap().push(img.dimensions());
            if self.fail {
                return Err(anyhow!("tesseract exited with status 1"));
            }
            Ok(self.answers.get(&img.dimensions()).cloned().unwrap_or_default())
        }
    }

    /// A canonical frame with a size swatch painted where `ANCHOR` puts it.
    pub fn road_frame(swatch: [u8; 3]) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
        let config = CaptureConfig::default();
        let mut frame = ImageBuffer::from_pixel(
            config.canonical_width,
            config.canonical_height,
            Rgba([0, 0, 0, 255]),
        );
        let rect = config.size_swatch.resolve(ANCHOR.0, ANCHOR.1);
        let x0 = (config.map_region.x + rect.x) as u32;
        let y0 = (config.map_region.y + rect.y) as u32;
        for y in y0..y0 + rect.height {
            for x in x0..x0 + rect.width {
                frame.put_pixel(x, y, Rgba([swatch[0], swatch[1], swatch[2], 255]));
            }
        }
        frame
    }

    pub fn catalog() -> Vec<Zone> {
        [
            "Stinkhag",
            "Sectun-Qinsom",
            "Hasitos-Umayaum",
            "Tonitos-Uxavrom",
            "Conquerors' Hall Lvl. 1",
        ]
        .iter()
        .enumerate()
        .map(|(i, name)| Zone {
            id: i as i64 + 1,
            name: name.to_string(),
            ..Zone::default()
        })
        .collect()
    }

    pub const MEDIUM: [u8; 3] = [54, 155, 204];
}

//! Configuration for the capture pipeline.
//!
//! Loads settings from config.json at startup. Provides region offsets in the
//! normalized frame, the landmark label, matching thresholds and timing.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::detection::color::{PortalSize, SizeReference};

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<CaptureConfig> = OnceLock::new();

/// A rectangle in absolute pixel coordinates.
/// The origin may be negative; pixels outside the source image read as transparent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// A rectangle positioned relative to the top-left corner of an anchor box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorOffset {
    pub dx: i32,
    pub dy: i32,
    pub width: u32,
    pub height: u32,
}

impl AnchorOffset {
    /// Resolves the offset against an anchor's top-left corner.
    pub fn resolve(&self, left: i32, top: i32) -> PixelRect {
        PixelRect::new(left + self.dx, top + self.dy, self.width, self.height)
    }
}

/// Tesseract invocation settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language pack
    #[serde(default = "default_language")]
    pub language: String,
    /// Tesseract page segmentation mode (11 = sparse text)
    #[serde(default = "default_page_segmentation")]
    pub page_segmentation: u8,
    /// Keep only pixels with R, G, B all above this value before recognition
    #[serde(default)]
    pub threshold: Option<u8>,
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_page_segmentation() -> u8 {
    11
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            page_segmentation: default_page_segmentation(),
            threshold: None,
        }
    }
}

/// Complete capture configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Width every frame is scaled to before any region is cut
    pub canonical_width: u32,
    /// Height every frame is scaled to before any region is cut
    pub canonical_height: u32,
    /// Delay between detection ticks (milliseconds)
    pub poll_interval_ms: u64,
    /// Text of the landmark box on the road overlay
    pub anchor_label: String,
    /// Coarse crop searched for the landmark
    pub map_region: PixelRect,
    /// Current location label, independent of the landmark
    pub current_zone_region: PixelRect,
    /// Portal info panel, relative to the landmark box (map crop coordinates)
    pub portal_panel: AnchorOffset,
    /// Size the portal panel is rescaled to
    pub portal_panel_size: (u32, u32),
    /// Portal size swatch, relative to the landmark box (map crop coordinates)
    pub size_swatch: AnchorOffset,
    /// Destination zone name inside the portal panel
    pub destination_region: PixelRect,
    /// Remaining time inside the portal panel
    pub timer_region: PixelRect,
    /// Reference swatch colors, one per portal size
    pub size_references: [SizeReference; 3],
    /// Maximum edit distance accepted for the current location
    pub origin_max_distance: Option<usize>,
    /// Maximum edit distance accepted for the destination
    pub destination_max_distance: Option<usize>,
    /// Zones whose names start with one of these are never used as origin
    pub excluded_prefixes: Vec<String>,
    /// Tesseract settings
    pub ocr: OcrConfig,
    /// Executable name of the game, used by the window frame source
    pub window_process: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            canonical_width: 3840,
            canonical_height: 2160,
            poll_interval_ms: 1000,
            anchor_label: "Road of Avalon".to_string(),
            map_region: PixelRect::new(2800, 1400, 1040, 670),
            current_zone_region: PixelRect::new(3330, 2070, 270, 60),
            portal_panel: AnchorOffset {
                dx: -137,
                dy: -23,
                width: 720,
                height: 225,
            },
            portal_panel_size: (725, 225),
            size_swatch: AnchorOffset {
                dx: -70,
                dy: 20,
                width: 10,
                height: 10,
            },
            destination_region: PixelRect::new(130, 50, 400, 50),
            timer_region: PixelRect::new(415, 125, 725, 125),
            size_references: [
                SizeReference::new([139, 180, 60], PortalSize::Small),
                SizeReference::new([54, 155, 204], PortalSize::Medium),
                SizeReference::new([177, 129, 19], PortalSize::Large),
            ],
            origin_max_distance: Some(2),
            destination_max_distance: None,
            excluded_prefixes: vec!["Conquerors".to_string()],
            ocr: OcrConfig::default(),
            window_process: "Albion-Online.exe".to_string(),
        }
    }
}

/// Loads configuration from a JSON file, falling back to defaults.
pub fn load_config_from(config_path: &Path) -> CaptureConfig {
    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    CaptureConfig::default()
}

/// Initializes the global configuration. Call once at startup.
/// Uses `path` when given, otherwise config.json next to the executable.
pub fn init_config(path: Option<&Path>) {
    let config = match path {
        Some(p) => load_config_from(p),
        None => load_config_from(&crate::paths::get_config_path()),
    };
    let _ = CONFIG.set(config);
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static CaptureConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let json = r#"{ "anchor_label": "Roads", "poll_interval_ms": 500 }"#;
        let config: CaptureConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.anchor_label, "Roads");
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.canonical_width, 3840);
        assert_eq!(config.map_region, PixelRect::new(2800, 1400, 1040, 670));
        assert_eq!(config.origin_max_distance, Some(2));
        assert_eq!(config.size_references[2].size, PortalSize::Large);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "ocr": {{ "threshold": 180 }} }}"#).unwrap();

        let config = load_config_from(file.path());
        assert_eq!(config.ocr.threshold, Some(180));
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.page_segmentation, 11);
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let config = load_config_from(file.path());
        assert_eq!(config.anchor_label, "Road of Avalon");
    }

    #[test]
    fn test_size_references_use_capacity_values() {
        let json = r#"{ "size_references": [
            { "color": [1, 2, 3], "size": 2 },
            { "color": [4, 5, 6], "size": 7 },
            { "color": [7, 8, 9], "size": 20 }
        ] }"#;
        let config: CaptureConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.size_references[1].size, PortalSize::Medium);

        let json = r#"{ "size_references": [
            { "color": [1, 2, 3], "size": 2 },
            { "color": [4, 5, 6], "size": 5 },
            { "color": [7, 8, 9], "size": 20 }
        ] }"#;
        assert!(serde_json::from_str::<CaptureConfig>(json).is_err());

        let saved = serde_json::to_value(CaptureConfig::default()).unwrap();
        assert_eq!(saved["size_references"][2]["size"], 20);
    }

    #[test]
    fn test_anchor_offset_resolve() {
        let offset = AnchorOffset { dx: -137, dy: -23, width: 720, height: 225 };
        assert_eq!(offset.resolve(100, 10), PixelRect::new(-37, -13, 720, 225));
    }
}

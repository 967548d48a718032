//! Portal size classification from the color of the size swatch.

use image::{ImageBuffer, Rgba};
use serde::{Deserialize, Serialize};

/// Portal size as shown by the swatch color.
///
/// `None` means "not determined yet"; the game has no zero-size road.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PortalSize {
    #[default]
    None,
    Small,
    Medium,
    Large,
}

impl PortalSize {
    /// Player capacity used by the portal vocabulary (0, 2, 7 or 20).
    pub fn value(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Small => 2,
            Self::Medium => 7,
            Self::Large => 20,
        }
    }

    /// Inverse of `value()`. Any other number is not a portal size.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            2 => Some(Self::Small),
            7 => Some(Self::Medium),
            20 => Some(Self::Large),
            _ => None,
        }
    }
}

impl TryFrom<u8> for PortalSize {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| format!("{} is not a portal size", value))
    }
}

impl From<PortalSize> for u8 {
    fn from(size: PortalSize) -> u8 {
        size.value()
    }
}

/// A reference swatch color and the size it stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeReference {
    pub color: [u8; 3],
    pub size: PortalSize,
}

impl SizeReference {
    pub const fn new(color: [u8; 3], size: PortalSize) -> Self {
        Self { color, size }
    }
}

/// Averages the RGB channels of a swatch, flooring each channel.
///
/// The first pixel is skipped (sampling starts at byte offset 4); the
/// configured size colors were measured that way. Returns `None` when no
/// pixel is left to sample.
pub fn mean_color(img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Option<[u8; 3]> {
    let mut sum = [0u64; 3];
    let mut count = 0u64;

    for pixel in img.pixels().skip(1) {
        sum[0] += pixel[0] as u64;
        sum[1] += pixel[1] as u64;
        sum[2] += pixel[2] as u64;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    Some([
        (sum[0] / count) as u8,
        (sum[1] / count) as u8,
        (sum[2] / count) as u8,
    ])
}

fn squared_distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

/// Returns the size of the nearest reference color.
///
/// Ties go to the earlier reference: the best match is only replaced by a
/// strictly closer one.
pub fn classify_size(color: [u8; 3], references: &[SizeReference]) -> PortalSize {
    let mut best: Option<(u32, PortalSize)> = None;

    for reference in references {
        let distance = squared_distance(color, reference.color);
        match best {
            Some((best_distance, _)) if best_distance <= distance => {}
            _ => best = Some((distance, reference.size)),
        }
    }

    best.map(|(_, size)| size).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaptureConfig;

    fn swatch(color: [u8; 3]) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
        ImageBuffer::from_pixel(10, 10, Rgba([color[0], color[1], color[2], 255]))
    }

    #[test]
    fn test_reference_colors_classify_to_their_size() {
        let refs = CaptureConfig::default().size_references;
        assert_eq!(classify_size([139, 180, 60], &refs), PortalSize::Small);
        assert_eq!(classify_size([54, 155, 204], &refs), PortalSize::Medium);
        assert_eq!(classify_size([177, 129, 19], &refs), PortalSize::Large);
    }

    #[test]
    fn test_nearby_colors() {
        let refs = CaptureConfig::default().size_references;
        // Slightly compressed blue swatch
        assert_eq!(classify_size([60, 150, 190], &refs), PortalSize::Medium);
        // Washed-out yellow
        assert_eq!(classify_size([190, 140, 40], &refs), PortalSize::Large);
    }

    #[test]
    fn test_equidistant_color_goes_to_first_reference() {
        let refs = [
            SizeReference::new([0, 0, 0], PortalSize::Small),
            SizeReference::new([10, 0, 0], PortalSize::Medium),
            SizeReference::new([200, 200, 200], PortalSize::Large),
        ];
        assert_eq!(classify_size([5, 0, 0], &refs), PortalSize::Small);

        let refs = [
            SizeReference::new([200, 200, 200], PortalSize::Large),
            SizeReference::new([0, 0, 0], PortalSize::Medium),
            SizeReference::new([10, 0, 0], PortalSize::Small),
        ];
        assert_eq!(classify_size([5, 0, 0], &refs), PortalSize::Medium);
    }

    #[test]
    fn test_mean_color_skips_first_pixel() {
        let mut img = swatch([54, 155, 204]);
        // The first pixel never contributes
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        assert_eq!(mean_color(&img), Some([54, 155, 204]));
    }

    #[test]
    fn test_mean_color_floors() {
        let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(3, 1);
        img.put_pixel(1, 0, Rgba([10, 0, 1, 255]));
        img.put_pixel(2, 0, Rgba([11, 0, 2, 255]));
        assert_eq!(mean_color(&img), Some([10, 0, 1]));
    }

    #[test]
    fn test_mean_color_single_pixel() {
        let img = ImageBuffer::from_pixel(1, 1, Rgba([1, 2, 3, 255]));
        assert_eq!(mean_color(&img), None);
    }

    #[test]
    fn test_portal_size_values() {
        assert_eq!(PortalSize::None.value(), 0);
        assert_eq!(PortalSize::Small.value(), 2);
        assert_eq!(PortalSize::Medium.value(), 7);
        assert_eq!(PortalSize::Large.value(), 20);
        assert_eq!(PortalSize::from_value(7), Some(PortalSize::Medium));
        assert_eq!(PortalSize::from_value(5), None);
    }
}

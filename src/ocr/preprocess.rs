use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, Rgba};

use crate::config::PixelRect;

/// Converts image to binary by keeping only bright pixels.
///
/// Pixels where R > threshold AND G > threshold AND B > threshold become black (text).
/// All other pixels become white (background).
///
/// The overlay text is light on a dark panel, so this isolates it from
/// textured map backgrounds before recognition.
pub fn threshold_bright_pixels(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    threshold: u8,
) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let r = pixel[0];
        let g = pixel[1];
        let b = pixel[2];

        let value = if r > threshold && g > threshold && b > threshold {
            0u8 // Black (text)
        } else {
            255u8 // White (background)
        };

        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Cuts a pixel rectangle out of an image.
///
/// The result always has the requested size. Parts of the rectangle that fall
/// outside the source (including negative origins) stay transparent black.
pub fn crop_rect(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    rect: &PixelRect,
) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    let mut output = ImageBuffer::new(rect.width, rect.height);
    let (w, h) = img.dimensions();

    let x0 = rect.x.max(0);
    let y0 = rect.y.max(0);
    let x1 = (rect.x + rect.width as i32).min(w as i32);
    let y1 = (rect.y + rect.height as i32).min(h as i32);

    if x0 >= x1 || y0 >= y1 {
        return output;
    }

    let visible =
        imageops::crop_imm(img, x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
            .to_image();
    imageops::replace(
        &mut output,
        &visible,
        (x0 - rect.x) as i64,
        (y0 - rect.y) as i64,
    );

    output
}

/// Shrinks a rectangle so it ends inside a `width` x `height` image.
pub fn clamp_rect(rect: &PixelRect, width: u32, height: u32) -> PixelRect {
    let right = (rect.x + rect.width as i32).min(width as i32);
    let bottom = (rect.y + rect.height as i32).min(height as i32);
    PixelRect::new(
        rect.x,
        rect.y,
        (right - rect.x).max(0) as u32,
        (bottom - rect.y).max(0) as u32,
    )
}

/// The part of a raw frame that maps onto the canonical frame.
///
/// Frames wider than the canonical aspect ratio lose their left edge; the
/// overlays sit on the right-hand side of the screen. Narrower frames get a
/// negative offset, which pads the left edge instead.
pub fn normalization_source(
    raw_width: u32,
    raw_height: u32,
    canonical_width: u32,
    canonical_height: u32,
) -> PixelRect {
    let tw = raw_width as f64 / canonical_width as f64;
    let hratio = (canonical_height as f64 / raw_height as f64) * tw;
    let scaled = canonical_width as f64 * tw;
    let offset = (scaled - scaled / hratio).round() as i32;

    PixelRect::new(
        offset,
        0,
        (raw_width as i32 - offset).max(0) as u32,
        raw_height,
    )
}

/// Rescales a raw frame to the canonical resolution so fixed offsets apply.
pub fn normalize_frame(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    canonical_width: u32,
    canonical_height: u32,
) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return ImageBuffer::new(canonical_width, canonical_height);
    }

    let source = normalization_source(w, h, canonical_width, canonical_height);
    if source.x == 0 && w == canonical_width && h == canonical_height {
        return img.clone();
    }

    let cropped = crop_rect(img, &source);
    imageops::resize(&cropped, canonical_width, canonical_height, FilterType::Triangle)
}

/// Rescales a crop when its target surface has a different size.
pub fn fit_to(
    img: ImageBuffer<Rgba<u8>, Vec<u8>>,
    width: u32,
    height: u32,
) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    if img.dimensions() == (width, height) {
        img
    } else {
        imageops::resize(&img, width, height, FilterType::Triangle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_rect_inside() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(100, 200, |x, y| Rgba([x as u8, y as u8, 0, 255]));

        let cropped = crop_rect(&img, &PixelRect::new(10, 50, 50, 20));

        assert_eq!(cropped.dimensions(), (50, 20));
        assert_eq!(cropped.get_pixel(0, 0)[0], 10);
        assert_eq!(cropped.get_pixel(0, 0)[1], 50);
        assert_eq!(cropped.get_pixel(49, 19)[0], 59);
    }

    #[test]
    fn test_crop_rect_pads_outside_source() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(100, 100, Rgba([9, 9, 9, 255]));

        let cropped = crop_rect(&img, &PixelRect::new(-5, 95, 10, 10));

        assert_eq!(cropped.dimensions(), (10, 10));
        // Left of the source
        assert_eq!(cropped.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
        // Overlap
        assert_eq!(cropped.get_pixel(5, 0), &Rgba([9, 9, 9, 255]));
        // Below the source
        assert_eq!(cropped.get_pixel(5, 5), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_crop_rect_fully_outside() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let cropped = crop_rect(&img, &PixelRect::new(50, 50, 4, 4));
        assert_eq!(cropped.dimensions(), (4, 4));
        assert!(cropped.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_clamp_rect() {
        // Timer region inside the 725x225 portal panel
        assert_eq!(
            clamp_rect(&PixelRect::new(415, 125, 725, 125), 725, 225),
            PixelRect::new(415, 125, 310, 100)
        );
        assert_eq!(
            clamp_rect(&PixelRect::new(10, 10, 5, 5), 725, 225),
            PixelRect::new(10, 10, 5, 5)
        );
        assert_eq!(
            clamp_rect(&PixelRect::new(800, 10, 5, 5), 725, 225),
            PixelRect::new(800, 10, 0, 5)
        );
    }

    #[test]
    fn test_normalization_source_16_9_has_no_offset() {
        assert_eq!(
            normalization_source(1920, 1080, 3840, 2160),
            PixelRect::new(0, 0, 1920, 1080)
        );
        assert_eq!(
            normalization_source(3840, 2160, 3840, 2160),
            PixelRect::new(0, 0, 3840, 2160)
        );
    }

    #[test]
    fn test_normalization_source_ultrawide_drops_left_edge() {
        // 3440x1440: the 16:9 part is 2560 wide
        assert_eq!(
            normalization_source(3440, 1440, 3840, 2160),
            PixelRect::new(880, 0, 2560, 1440)
        );
    }

    #[test]
    fn test_normalization_source_narrow_pads_left_edge() {
        // 4:3 at 1440x1080: the 16:9 box is 1920 wide
        assert_eq!(
            normalization_source(1440, 1080, 3840, 2160),
            PixelRect::new(-480, 0, 1920, 1080)
        );
    }

    #[test]
    fn test_normalize_frame_scales_to_canonical() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(384, 216, Rgba([40, 80, 120, 255]));
        let normalized = normalize_frame(&img, 3840, 2160);
        assert_eq!(normalized.dimensions(), (3840, 2160));
        assert_eq!(normalized.get_pixel(1920, 1080), &Rgba([40, 80, 120, 255]));
    }

    #[test]
    fn test_normalize_frame_keeps_canonical_input() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(64, 36, |x, _| Rgba([x as u8, 0, 0, 255]));
        let normalized = normalize_frame(&img, 64, 36);
        assert_eq!(normalized, img);
    }

    #[test]
    fn test_threshold_bright_pixels() {
        let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(3, 1);

        img.put_pixel(0, 0, Rgba([100, 100, 100, 255]));
        img.put_pixel(1, 0, Rgba([250, 250, 250, 255]));
        img.put_pixel(2, 0, Rgba([250, 250, 100, 255]));

        let result = threshold_bright_pixels(&img, 190);

        assert_eq!(result.get_pixel(0, 0)[0], 255, "Dark pixel should become white");
        assert_eq!(result.get_pixel(1, 0)[0], 0, "Bright pixel should become black");
        assert_eq!(result.get_pixel(2, 0)[0], 255, "Partially dark pixel should become white");
    }
}

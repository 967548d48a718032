//! Landmark lookup in the recognised boxes of the map crop.

use crate::error::CaptureError;
use crate::ocr::RecognizedTextBox;

/// Returns the first box whose text contains `label`.
///
/// Recognition often merges the landmark with neighbouring words on the same
/// line, so an exact comparison would miss it.
pub fn find_anchor(
    boxes: &[RecognizedTextBox],
    label: &str,
) -> Result<RecognizedTextBox, CaptureError> {
    boxes
        .iter()
        .find(|b| b.text.contains(label))
        .cloned()
        .ok_or_else(|| CaptureError::AnchorNotFound(label.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::BoundingBox;

    fn text_box(text: &str, left: i32, top: i32) -> RecognizedTextBox {
        RecognizedTextBox {
            text: text.to_string(),
            bounds: BoundingBox { left, top, width: 200, height: 24 },
            confidence: 90.0,
        }
    }

    #[test]
    fn test_finds_exact_label() {
        let boxes = vec![text_box("Stinkhag", 0, 0), text_box("Road of Avalon", 500, 300)];
        let anchor = find_anchor(&boxes, "Road of Avalon").unwrap();
        assert_eq!(anchor.bounds.left, 500);
        assert_eq!(anchor.bounds.top, 300);
    }

    #[test]
    fn test_finds_label_inside_longer_line() {
        let boxes = vec![text_box("» Road of Avalon «", 12, 34)];
        assert_eq!(find_anchor(&boxes, "Road of Avalon").unwrap().bounds.left, 12);
    }

    #[test]
    fn test_first_match_wins() {
        let boxes = vec![text_box("Road of Avalon", 1, 1), text_box("Road of Avalon", 2, 2)];
        assert_eq!(find_anchor(&boxes, "Road of Avalon").unwrap().bounds.left, 1);
    }

    #[test]
    fn test_missing_label() {
        let boxes = vec![text_box("Road of", 0, 0), text_box("road of avalon", 0, 0)];
        assert!(matches!(
            find_anchor(&boxes, "Road of Avalon"),
            Err(CaptureError::AnchorNotFound(label)) if label == "Road of Avalon"
        ));
        assert!(find_anchor(&[], "Road of Avalon").is_err());
    }
}

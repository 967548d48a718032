pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::{BoundingBox, RecognizedTextBox, Recognition, TesseractRecognizer, TextRecognizer};
pub use extract::{extract_timer, parse_timer};
pub use preprocess::{crop_rect, normalize_frame};
pub use setup::probe_recognition;

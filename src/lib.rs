//! Road Capture
//!
//! Watches a live capture of the game screen, reads the "Road of Avalon"
//! portal overlay and the current-location label, and reports the detected
//! road (origin zone, destination zone, portal size and remaining time) once
//! every field has been recognised.
//!
//! This crate provides:
//! - Frame sources and frame normalization (`capture`, `ocr::preprocess`)
//! - Text recognition through Tesseract (`ocr`)
//! - Zone catalog search and fuzzy matching (`catalog`)
//! - The per-tick detection pipeline (`detection`)
//! - The polling capture session (`session`)

pub mod capture;
pub mod catalog;
pub mod config;
pub mod detection;
pub mod error;
pub mod ocr;
pub mod paths;
pub mod session;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

pub use error::CaptureError;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("road_capture.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

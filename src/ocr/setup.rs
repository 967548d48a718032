use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use super::engine::{Recognition, TesseractRecognizer};
use crate::config::OcrConfig;
use crate::log;

/// Where Tesseract was found on this host.
#[derive(Clone, Debug)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` lets Tesseract use its compiled-in tessdata location
    pub tessdata: Option<PathBuf>,
}

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

#[cfg(windows)]
const INSTALL_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];
#[cfg(not(windows))]
const INSTALL_DIRS: &[&str] = &["/usr/local/bin", "/usr/bin", "/opt/homebrew/bin"];

/// Finds the Tesseract executable: bundled dir first, then PATH, then install dirs.
pub fn find_tesseract_executable() -> Result<PathBuf> {
    let local_exe = crate::paths::get_tesseract_dir().join(EXECUTABLE_NAME);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for dir in INSTALL_DIRS {
        let p = PathBuf::from(dir).join(EXECUTABLE_NAME);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory holding `<language>.traineddata`, if any.
pub fn find_tessdata_dir(language: &str) -> Option<PathBuf> {
    let traineddata = format!("{}.traineddata", language);

    let mut candidates = vec![crate::paths::get_tesseract_dir().join("tessdata")];

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix);
    }

    #[cfg(windows)]
    candidates.extend(INSTALL_DIRS.iter().map(|d| PathBuf::from(d).join("tessdata")));

    if let Some(data_dir) = dirs::data_local_dir() {
        candidates.push(data_dir.join("road-capture").join("tessdata"));
    }

    candidates
        .into_iter()
        .find(|dir| dir.join(&traineddata).exists())
}

/// Locates Tesseract for the configured language.
pub fn locate_tesseract(language: &str) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable()?;
    let tessdata = find_tessdata_dir(language);
    Ok(TesseractPaths { executable, tessdata })
}

/// Probes the host once for a text recognizer.
///
/// Never fails: a missing Tesseract yields `Recognition::Absent`, and whoever
/// owns the capability reports the reason to the user.
pub fn probe_recognition(config: &OcrConfig) -> Recognition {
    match locate_tesseract(&config.language) {
        Ok(paths) => {
            log(&format!(
                "Tesseract found at: {} (tessdata: {})",
                paths.executable.display(),
                paths
                    .tessdata
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "default".to_string())
            ));
            Recognition::Available(Arc::new(TesseractRecognizer::new(paths, config.clone())))
        }
        Err(e) => Recognition::Absent {
            reason: e.to_string(),
        },
    }
}

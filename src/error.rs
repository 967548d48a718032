//! Error kinds surfaced by the capture pipeline.
//!
//! Only `CapabilityAbsent`, `PermissionDenied` and `DeviceUnavailable` ever
//! leave a capture session. The rest are produced and consumed inside a
//! detection tick.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// Text recognition is not installed on this host.
    #[error("text recognition unavailable: {0}")]
    CapabilityAbsent(String),

    /// The user or the OS refused access to the frame source.
    #[error("screen capture permission denied: {0}")]
    PermissionDenied(String),

    /// The frame source could not be opened.
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The landmark label is not visible in the current frame.
    #[error("anchor \"{0}\" not found in frame")]
    AnchorNotFound(String),

    /// The recognised text is too far from any usable catalog entry.
    #[error("no zone matches \"{text}\" (closest: {closest:?}, distance {distance})")]
    NoFuzzyMatch {
        text: String,
        closest: Option<String>,
        distance: usize,
    },

    /// A caller broke a contract, e.g. matching against an empty catalog.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CaptureError {
    /// True for the errors that end a `start()` attempt and keep the session idle.
    pub fn is_session_level(&self) -> bool {
        matches!(
            self,
            Self::CapabilityAbsent(_) | Self::PermissionDenied(_) | Self::DeviceUnavailable(_)
        )
    }
}

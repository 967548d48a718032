/// Capture session lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Capturing,
}

impl SessionState {
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Capturing => "Capturing...",
        }
    }
}

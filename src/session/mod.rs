//! Polling capture session: start/stop, debug toggle and status line.

pub mod controller;
pub mod state;

pub use controller::CaptureSession;
pub use state::SessionState;

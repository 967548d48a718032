//! Frame acquisition.
//!
//! This module provides:
//! - The `FrameSource` trait polled by the capture session
//! - Replay of saved screenshots (`ImageSequenceSource`)
//! - On Windows, live frames of the game window (`WindowFrameSource`)

#[cfg(windows)]
pub mod screenshot;
pub mod source;
#[cfg(windows)]
pub mod window;

#[cfg(windows)]
pub use screenshot::WindowFrameSource;
pub use source::{FrameSource, ImageSequenceSource};

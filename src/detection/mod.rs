//! Per-tick recognition of the road overlay.
//!
//! This module provides:
//! - Portal size classification from the swatch color (`color`)
//! - Landmark lookup (`anchor`)
//! - The detection tick itself and its commit policy (`cycle`)
//! - The result sink and preview surfaces the tick reports to

pub mod anchor;
pub mod candidate;
pub mod color;
pub mod cycle;
pub mod preview;
pub mod sink;

pub use anchor::find_anchor;
pub use candidate::{DetectionCandidate, DurationEstimate};
pub use color::{classify_size, mean_color, PortalSize, SizeReference};
pub use cycle::{DetectionCycle, TickOutcome};
pub use preview::{DirectoryPreview, PreviewStage, PreviewSurface};
pub use sink::{LogSink, ResultSink};

//! Receiver for committed detections.

use super::color::PortalSize;
use crate::catalog::Zone;

/// Setters invoked once per committed tick, always in this order:
/// origin, destination, size, hours, minutes.
///
/// `set_minutes` is the last call of a commit. A sink that handles the road
/// as a whole acts there.
pub trait ResultSink: Send {
    fn set_origin(&mut self, zone: &Zone);
    fn set_destination(&mut self, zone: &Zone);
    fn set_portal_size(&mut self, size: PortalSize);
    fn set_hours(&mut self, hours: u32);
    fn set_minutes(&mut self, minutes: u32);
}

/// Sink that writes each committed road to the log.
#[derive(Debug, Default)]
pub struct LogSink {
    origin: String,
    destination: String,
    size: PortalSize,
    hours: u32,
}

impl ResultSink for LogSink {
    fn set_origin(&mut self, zone: &Zone) {
        self.origin = zone.name.clone();
    }

    fn set_destination(&mut self, zone: &Zone) {
        self.destination = zone.name.clone();
    }

    fn set_portal_size(&mut self, size: PortalSize) {
        self.size = size;
    }

    fn set_hours(&mut self, hours: u32) {
        self.hours = hours;
    }

    fn set_minutes(&mut self, minutes: u32) {
        crate::log(&format!("Road committed: {}", self.summary(minutes)));
    }
}

impl LogSink {
    fn summary(&self, minutes: u32) -> String {
        format!(
            "{} -> {} (size {}, {}h {}m)",
            self.origin,
            self.destination,
            self.size.value(),
            self.hours,
            minutes
        )
    }
}

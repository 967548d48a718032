use serde::{Deserialize, Serialize};

use super::color::PortalSize;

/// Time left before a road collapses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationEstimate {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl DurationEstimate {
    pub const fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self { hours, minutes, seconds }
    }

    /// No timer text was readable.
    pub fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }
}

/// The road read from one tick. Committed only when every field is known.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionCandidate {
    /// Zone the player is standing in
    pub origin: String,
    /// Zone the portal leads to
    pub destination: String,
    pub duration: DurationEstimate,
    pub size: PortalSize,
}

impl DetectionCandidate {
    /// Both names known and a size determined. A zero duration still counts.
    pub fn is_committable(&self) -> bool {
        !self.origin.is_empty() && !self.destination.is_empty() && self.size != PortalSize::None
    }

    /// Human-readable summary shown after a commit.
    pub fn status_line(&self) -> String {
        format!(
            "Road Detected: {} {} {} {}h {}m{}s",
            self.origin,
            self.destination,
            self.size.value(),
            self.duration.hours,
            self.duration.minutes,
            self.duration.seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> DetectionCandidate {
        DetectionCandidate {
            origin: "Sectun-Qinsom".to_string(),
            destination: "Hasitos-Umayaum".to_string(),
            duration: DurationEstimate::new(3, 12, 0),
            size: PortalSize::Medium,
        }
    }

    #[test]
    fn test_full_candidate_is_committable() {
        assert!(full().is_committable());
    }

    #[test]
    fn test_zero_duration_still_committable() {
        let candidate = DetectionCandidate {
            duration: DurationEstimate::default(),
            ..full()
        };
        assert!(candidate.is_committable());
    }

    #[test]
    fn test_three_of_four_fields_not_committable() {
        let no_origin = DetectionCandidate { origin: String::new(), ..full() };
        let no_destination = DetectionCandidate { destination: String::new(), ..full() };
        let no_size = DetectionCandidate { size: PortalSize::None, ..full() };

        assert!(!no_origin.is_committable());
        assert!(!no_destination.is_committable());
        assert!(!no_size.is_committable());
        assert!(!DetectionCandidate::default().is_committable());
    }

    #[test]
    fn test_status_line() {
        assert_eq!(
            full().status_line(),
            "Road Detected: Sectun-Qinsom Hasitos-Umayaum 7 3h 12m0s"
        );
    }
}

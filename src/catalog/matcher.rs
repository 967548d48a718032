//! Nearest catalog name for noisy recognised text.

use strsim::levenshtein;

use super::Zone;
use crate::error::CaptureError;

/// Index and edit distance of the closest candidate.
///
/// Comparison is case-sensitive. Equal distances keep the earliest candidate.
pub fn closest<S: AsRef<str>>(
    text: &str,
    candidates: &[S],
) -> Result<(usize, usize), CaptureError> {
    let mut best: Option<(usize, usize)> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let distance = levenshtein(text, candidate.as_ref());
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((index, distance)),
        }
        if distance == 0 {
            break;
        }
    }

    best.ok_or_else(|| CaptureError::InvalidArgument("cannot match against an empty catalog".into()))
}

/// A zone accepted for some recognised text.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneMatch<'a> {
    pub zone: &'a Zone,
    pub distance: usize,
}

/// Matches recognised text to a zone, applying the caller's acceptance rules.
///
/// `max_distance` of `None` accepts the nearest zone whatever its distance.
/// Zones whose display name starts with one of `excluded_prefixes` are rejected
/// even on an exact match.
pub fn match_zone<'a>(
    text: &str,
    zones: &'a [Zone],
    max_distance: Option<usize>,
    excluded_prefixes: &[String],
) -> Result<ZoneMatch<'a>, CaptureError> {
    let names: Vec<&str> = zones.iter().map(|z| z.display_name()).collect();
    let (index, distance) = closest(text, &names)?;
    let zone = &zones[index];

    let too_far = max_distance.is_some_and(|max| distance > max);
    let excluded = excluded_prefixes
        .iter()
        .any(|prefix| zone.display_name().starts_with(prefix.as_str()));

    if too_far || excluded {
        return Err(CaptureError::NoFuzzyMatch {
            text: text.to_string(),
            closest: Some(zone.display_name().to_string()),
            distance,
        });
    }

    Ok(ZoneMatch { zone, distance })
}

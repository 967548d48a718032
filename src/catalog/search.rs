//! Type-ahead search over zone names.
//!
//! A query is split on whitespace. A name matches when every token is a
//! case-insensitive prefix of one of the name's words, where words begin at
//! the start of the name or after a space or hyphen. Tokens may hit the same
//! word or different words in any order.

use super::Zone;

fn is_word_separator(c: char) -> bool {
    c.is_whitespace() || c == '-'
}

/// Byte offsets in `name` where a word begins.
fn word_starts(name: &str) -> impl Iterator<Item = usize> + '_ {
    let mut previous: Option<char> = None;
    name.char_indices().filter_map(move |(i, c)| {
        let starts = previous.is_none_or(is_word_separator);
        previous = Some(c);
        starts.then_some(i)
    })
}

fn name_matches(name: &str, tokens: &[String]) -> bool {
    let lowered = name.to_lowercase();
    tokens.iter().all(|token| {
        word_starts(&lowered).any(|start| lowered[start..].starts_with(token.as_str()))
    })
}

/// Zones whose name matches every token of `query`, in catalog order.
///
/// An empty or blank query filters nothing.
pub fn filter_zones<'a>(zones: &'a [Zone], query: &str) -> Vec<&'a Zone> {
    let tokens: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    zones
        .iter()
        .filter(|zone| tokens.is_empty() || name_matches(&zone.name, &tokens))
        .collect()
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    let mut chars = s.chars();
    prefix
        .chars()
        .all(|p| chars.next().is_some_and(|c| chars_eq_ignore_case(c, p)))
}

/// Completion for `query` given the names that survived filtering.
///
/// Returns the longest case-insensitive common prefix of all candidates,
/// spelled as in the first candidate. Falls back to `query` unchanged when
/// there are no candidates or the common prefix does not extend the query.
pub fn get_max_string<S: AsRef<str>>(candidates: &[S], query: &str) -> String {
    let Some((first, rest)) = candidates.split_first() else {
        return query.to_string();
    };
    let first = first.as_ref();

    let mut end = first.len();
    for other in rest {
        let mut shared = 0;
        for (a, b) in first.char_indices().zip(other.as_ref().chars()) {
            if !chars_eq_ignore_case(a.1, b) {
                break;
            }
            shared = a.0 + a.1.len_utf8();
        }
        end = end.min(shared);
    }

    let prefix = &first[..end];
    if starts_with_ignore_case(prefix, query) {
        prefix.to_string()
    } else {
        query.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::zone;

    const NAMES: [&str; 21] = [
        "Stinkhag",
        "Sectun-Qinsom",
        "Bank of Thetford",
        "Bank of Lymhurst",
        "Mushroom Cave",
        "LEGACY-UNDEAD-02",
        "HomeTerritory Skirmish",
        "Frostpeak Ascent",
        "Flatrock Plateau",
        "Darkstone Drift",
        "Windgrass Border",
        "Highstone Loch",
        "Chambers of Truth",
        "Conquerors' Hall Lvl. 1",
        "Hasitos-Umayaum",
        "Tonitos-Uxavrom",
        "PSG-0051",
        "DNG-0602",
        "PSG-0041",
        "Secent-Qi-Odesom",
        "Sectun-In-Qinsom",
    ];

    fn catalog() -> Vec<Zone> {
        NAMES.iter().map(|n| zone(n)).collect()
    }

    fn names_of<'a>(zones: &[&'a Zone]) -> Vec<&'a str> {
        zones.iter().map(|z| z.name.as_str()).collect()
    }

    #[test]
    fn test_filter_single_token() {
        let zones = catalog();
        assert_eq!(filter_zones(&zones, "sectun").len(), 2);
        assert_eq!(filter_zones(&zones, "xxx").len(), 0);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let zones = catalog();
        assert_eq!(filter_zones(&zones, "SeCtuN").len(), 2);
        assert_eq!(
            names_of(&filter_zones(&zones, "SeCtuN-I")),
            vec!["Sectun-In-Qinsom"]
        );
    }

    #[test]
    fn test_filter_multiple_tokens() {
        let zones = catalog();
        assert_eq!(filter_zones(&zones, "Bank o").len(), 2);
        assert_eq!(filter_zones(&zones, "BA O").len(), 2);
        assert_eq!(filter_zones(&zones, "p 0").len(), 2);
        assert_eq!(
            names_of(&filter_zones(&zones, "sec qi")),
            vec!["Sectun-Qinsom", "Secent-Qi-Odesom", "Sectun-In-Qinsom"]
        );
    }

    #[test]
    fn test_filter_token_order_is_free() {
        let zones = catalog();
        assert_eq!(
            names_of(&filter_zones(&zones, "qi sec")),
            names_of(&filter_zones(&zones, "sec qi"))
        );
    }

    #[test]
    fn test_filter_tokens_only_match_word_starts() {
        let zones = catalog();
        // "inkhag" is inside a word
        assert!(filter_zones(&zones, "inkhag").is_empty());
    }

    #[test]
    fn test_filter_single_entry_and_empty_catalog() {
        let zones = vec![zone("HomeTerritory Skirmish")];
        assert_eq!(filter_zones(&zones, "ho").len(), 1);
        assert!(filter_zones(&[], "ho").is_empty());
    }

    #[test]
    fn test_filter_empty_query_keeps_everything() {
        let zones = catalog();
        assert_eq!(filter_zones(&zones, "").len(), NAMES.len());
        assert_eq!(filter_zones(&zones, "   ").len(), NAMES.len());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let zones = catalog();
        for query in ["sec qi", "b", "p 0", "ho", "s"] {
            let once: Vec<Zone> = filter_zones(&zones, query).into_iter().cloned().collect();
            let twice = filter_zones(&once, query);
            assert_eq!(names_of(&twice), once.iter().map(|z| z.name.as_str()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_max_string_common_prefix() {
        let names = ["Sectun-Qinsom", "Secent-Qi-Odesom", "Sectun-In-Qinsom"];
        assert_eq!(get_max_string(&names, "se"), "Sec");
        assert_eq!(get_max_string(&names, "sEc"), "Sec");
    }

    #[test]
    fn test_max_string_keeps_trailing_space() {
        let names = ["Bank of Thetford", "Bank of Lymhurst", "Bank of Batman", "Bank of Joker"];
        assert_eq!(get_max_string(&names, "b"), "Bank of ");
        assert_eq!(get_max_string(&names, "Ban"), "Bank of ");
        assert_eq!(get_max_string(&names, "bAnk o"), "Bank of ");
    }

    #[test]
    fn test_max_string_extends_past_hyphens() {
        let names = ["Sectun-Qinsom", "Sectun-Qi-Odesom", "Sectun-Qi-Qinsom"];
        assert_eq!(get_max_string(&names, "se"), "Sectun-Qi");
        assert_eq!(get_max_string(&names[1..], "Se"), "Sectun-Qi-");
    }

    #[test]
    fn test_max_string_single_and_empty() {
        assert_eq!(get_max_string(&["HomeTerritory Skirmish"], "ho"), "HomeTerritory Skirmish");
        let none: [&str; 0] = [];
        assert_eq!(get_max_string(&none, "xx"), "xx");
    }

    #[test]
    fn test_max_string_query_not_a_prefix() {
        let names = ["Stinkhag", "Stonewall"];
        assert_eq!(get_max_string(&names, "xx"), "xx");
    }

    #[test]
    fn test_filter_then_complete() {
        let zones = catalog();
        let hits = filter_zones(&zones, "bank");
        let names: Vec<&str> = hits.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(get_max_string(&names, "bank"), "Bank of ");
    }
}

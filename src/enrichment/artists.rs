//! Splitting raw artist credits into individual artists.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use smallvec::SmallVec;

use super::matching::normalize;

/// Credited artists; collaborations rarely exceed four names
pub type Artists = SmallVec<[String; 4]>;

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*(?:,|;|&|\s/\s|\(\s*(?:feat\.?|ft\.?|featuring|with)\s+|\s(?:feat\.?|ft\.?|featuring|with|x|vs\.?)\s)\s*",
    )
    .unwrap()
});

static AND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").unwrap());

/// Split a raw credit like `"A & B feat. C"` into `["A", "B", "C"]`.
///
/// Names are deduplicated by normalized form, first spelling wins.
/// `" and "` is only treated as a separator when the credit already
/// contains another one ("A, B and C"), so band names like
/// "Simon and Garfunkel" stay intact.
pub fn parse_artists(raw: &str) -> Artists {
    let parts: Vec<&str> = SEPARATORS.split(raw).collect();
    let parts: Vec<&str> = if parts.len() > 1 {
        parts.into_iter().flat_map(|p| AND.split(p)).collect()
    } else {
        parts
    };

    let mut seen = HashSet::new();
    let mut artists = Artists::new();
    for part in parts {
        let name = part.trim_matches(|c: char| c.is_whitespace() || c == '(' || c == ')');
        if name.is_empty() {
            continue;
        }
        let key = normalize(name);
        if !key.is_empty() && seen.insert(key) {
            artists.push(name.to_string());
        }
    }
    artists
}

/// First credited artist, or the trimmed raw string when nothing parses.
pub fn primary_artist(raw: &str) -> String {
    parse_artists(raw)
        .into_iter()
        .next()
        .unwrap_or_else(|| raw.trim().to_string())
}

/// Cache key for the artist table.
pub fn artist_key(name: &str) -> String {
    normalize(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &str) -> Vec<String> {
        parse_artists(raw).into_vec()
    }

    #[test]
    fn test_single_artist() {
        assert_eq!(names("The Weeknd"), vec!["The Weeknd"]);
        assert_eq!(names("  Daft Punk "), vec!["Daft Punk"]);
        assert!(names("   ").is_empty());
    }

    #[test]
    fn test_common_separators() {
        assert_eq!(names("A & B"), vec!["A", "B"]);
        assert_eq!(names("Calvin Harris, Dua Lipa"), vec!["Calvin Harris", "Dua Lipa"]);
        assert_eq!(names("Drake feat. Rihanna"), vec!["Drake", "Rihanna"]);
        assert_eq!(names("Drake ft. Rihanna"), vec!["Drake", "Rihanna"]);
        assert_eq!(names("Drake Featuring Rihanna"), vec!["Drake", "Rihanna"]);
        assert_eq!(names("Skrillex x Diplo"), vec!["Skrillex", "Diplo"]);
        assert_eq!(names("Artist A / Artist B"), vec!["Artist A", "Artist B"]);
        assert_eq!(names("Eminem (feat. Rihanna)"), vec!["Eminem", "Rihanna"]);
    }

    #[test]
    fn test_and_only_splits_lists() {
        assert_eq!(names("Simon and Garfunkel"), vec!["Simon and Garfunkel"]);
        assert_eq!(names("A, B and C"), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_unspaced_slash_is_kept() {
        assert_eq!(names("AC/DC"), vec!["AC/DC"]);
    }

    #[test]
    fn test_dedupes_by_normalized_name() {
        assert_eq!(names("The Weeknd & the weeknd"), vec!["The Weeknd"]);
    }

    #[test]
    fn test_primary_artist() {
        assert_eq!(primary_artist("The Weeknd & Daft Punk"), "The Weeknd");
        assert_eq!(primary_artist(""), "");
    }

    #[test]
    fn test_artist_key() {
        assert_eq!(artist_key("  The Weeknd!"), "the weeknd");
    }
}

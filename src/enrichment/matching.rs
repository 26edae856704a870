//! Fuzzy text matching used to validate provider candidates.
//!
//! Every provider client runs its candidates through these helpers before
//! accepting them, so "The Weeknd" and "the weeknd " link to the same record
//! while a cover version by a different artist does not.

use std::collections::HashSet;

/// Score for one string containing the other after normalization.
pub const CONTAINMENT_SCORE: f64 = 0.9;

/// Spotify weights title over artist when combining scores.
pub const TITLE_WEIGHT: f64 = 0.6;
pub const ARTIST_WEIGHT: f64 = 0.4;

/// Minimum combined score for a Spotify candidate.
pub const COMBINED_THRESHOLD: f64 = 0.7;

/// Title-only fallback: a near-exact title with a weak artist signal.
pub const FALLBACK_TITLE_THRESHOLD: f64 = 0.85;
pub const FALLBACK_ARTIST_THRESHOLD: f64 = 0.3;

/// Default artist threshold for providers that only validate the artist.
pub const ARTIST_THRESHOLD: f64 = 0.5;

// Thresholds are inclusive; absorb float noise from the weighted sum.
const EPSILON: f64 = 1e-9;

/// Lowercase, strip punctuation and collapse whitespace.
///
/// Separators like `-`, `_` and `/` become spaces so "AC/DC" and "ac dc"
/// compare equal.
pub fn normalize(value: &str) -> String {
    let mut normalized = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            normalized.extend(ch.to_lowercase().filter(|c| c.is_alphanumeric()));
        } else if ch.is_whitespace() || ch == '-' || ch == '_' || ch == '/' {
            normalized.push(' ');
        }
    }
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Word-set Jaccard similarity of two already-normalized strings.
pub fn jaccard(left: &str, right: &str) -> f64 {
    let left_tokens: HashSet<&str> = left.split_whitespace().collect();
    let right_tokens: HashSet<&str> = right.split_whitespace().collect();
    if left_tokens.is_empty() || right_tokens.is_empty() {
        return 0.0;
    }
    let overlap = left_tokens.intersection(&right_tokens).count() as f64;
    let union = left_tokens.union(&right_tokens).count() as f64;
    overlap / union
}

/// Similarity in `0.0..=1.0`: 1.0 exact, [`CONTAINMENT_SCORE`] on containment,
/// otherwise word Jaccard.
pub fn similarity(left: &str, right: &str) -> f64 {
    let left = normalize(left);
    let right = normalize(right);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    if left == right {
        return 1.0;
    }
    if left.contains(&right) || right.contains(&left) {
        return CONTAINMENT_SCORE;
    }
    jaccard(&left, &right)
}

/// Weighted title/artist score used by Spotify.
pub fn combined_score(title_similarity: f64, artist_similarity: f64) -> f64 {
    TITLE_WEIGHT * title_similarity + ARTIST_WEIGHT * artist_similarity
}

pub fn meets(score: f64, threshold: f64) -> bool {
    score + EPSILON >= threshold
}

/// Whether a candidate artist is close enough to the expected one.
pub fn artist_matches(expected: &str, candidate: &str, threshold: f64) -> bool {
    meets(similarity(expected, candidate), threshold)
}

/// Scores for a (title, artist) candidate against the wanted track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub title: f64,
    pub artist: f64,
}

impl MatchScore {
    pub fn compute(want_title: &str, want_artist: &str, title: &str, artist: &str) -> Self {
        Self {
            title: similarity(want_title, title),
            artist: similarity(want_artist, artist),
        }
    }

    pub fn combined(&self) -> f64 {
        combined_score(self.title, self.artist)
    }

    /// Spotify acceptance: combined score, or the title-only fallback.
    pub fn is_accepted(&self) -> bool {
        meets(self.combined(), COMBINED_THRESHOLD)
            || (meets(self.title, FALLBACK_TITLE_THRESHOLD)
                && meets(self.artist, FALLBACK_ARTIST_THRESHOLD))
    }
}

/// Remove version suffixes that hurt search recall, e.g.
/// `"Song (feat. X) - 2011 Remaster"` becomes `"Song"`.
pub fn clean_title(title: &str) -> String {
    let mut cleaned = title.trim();
    for open in ['(', '['] {
        if let Some(idx) = cleaned.find(open)
            && idx > 0
        {
            cleaned = cleaned[..idx].trim_end();
        }
    }
    if let Some(idx) = cleaned.find(" - ") {
        let suffix = cleaned[idx + 3..].to_lowercase();
        if ["remaster", "version", "edit", "mix", "live", "mono", "stereo"]
            .iter()
            .any(|marker| suffix.contains(marker))
        {
            cleaned = cleaned[..idx].trim_end();
        }
    }
    cleaned.to_string()
}

/// Drop blank and case-insensitively repeated queries, keeping order.
pub fn dedupe_queries<I>(queries: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .map(|q| q.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|q| !q.is_empty())
        .filter(|q| seen.insert(q.to_lowercase()))
        .collect()
}

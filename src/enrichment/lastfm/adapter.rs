//! Adapter layer: Convert Last.fm DTOs to domain models

use super::dto;
use crate::enrichment::domain::{ArtistImage, ArtistImageSource, EnrichmentError};
use crate::enrichment::matching::normalize;

/// Hash of the grey star placeholder Last.fm serves for every artist
/// without a real photo.
pub const PLACEHOLDER_IMAGE_HASH: &str = "2a96cbd8b46e442fc41c2b86b821562f";

/// Tags that describe the listener rather than the music
const NOISE_TAGS: &[&str] = &[
    "seen live",
    "favorites",
    "favourites",
    "favorite",
    "favourite",
    "my favorite",
    "love",
    "loved",
    "awesome",
    "beautiful",
    "amazing",
    "spotify",
    "under 2000 listeners",
];

const MAX_TAGS: usize = 5;

/// Map a Last.fm error object to our error taxonomy.
pub fn to_error(error: &dto::ApiError) -> EnrichmentError {
    match error.error {
        6 => EnrichmentError::NoMatches,
        10 | 26 => EnrichmentError::NotConfigured(format!("Last.fm: {}", error.message)),
        29 => EnrichmentError::RateLimited,
        11 | 16 => EnrichmentError::Http {
            status: 503,
            message: error.message.clone(),
        },
        _ => EnrichmentError::ApiError(format!("Last.fm error {}: {}", error.error, error.message)),
    }
}

pub fn is_noise_tag(tag: &str, artist: &str) -> bool {
    let normalized = normalize(tag);
    normalized.is_empty()
        || NOISE_TAGS.contains(&normalized.as_str())
        || normalized == normalize(artist)
}

/// Useful tags in Last.fm's order (already sorted by weight).
pub fn filter_tags(tags: &[dto::Tag], artist: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .filter(|t| t.count.is_none_or(|c| c > 0))
        .map(|t| t.name.trim())
        .filter(|name| !is_noise_tag(name, artist))
        .filter(|name| seen.insert(name.to_lowercase()))
        .take(MAX_TAGS)
        .map(|name| name.to_lowercase())
        .collect()
}

pub fn is_placeholder(url: &str) -> bool {
    url.contains(PLACEHOLDER_IMAGE_HASH)
}

fn size_rank(size: &str) -> u8 {
    match size {
        "mega" => 5,
        "extralarge" => 4,
        "large" => 3,
        "medium" => 2,
        "small" => 1,
        _ => 0,
    }
}

/// Largest real (non-placeholder) image of an artist.
pub fn to_artist_image(artist: &dto::ArtistInfo) -> Option<ArtistImage> {
    let url = artist
        .image
        .iter()
        .filter(|i| !i.url.trim().is_empty() && !is_placeholder(&i.url))
        .max_by_key(|i| size_rank(&i.size))?
        .url
        .clone();
    Some(ArtistImage {
        genres: artist
            .tags
            .as_ref()
            .map(|t| filter_tags(&t.tag, &artist.name))
            .unwrap_or_default(),
        ..ArtistImage::new(url, ArtistImageSource::LastFm)
    })
}

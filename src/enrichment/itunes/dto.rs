//! iTunes Search API Data Transfer Objects
//!
//! API Reference: https://performance-partners.apple.com/search-api

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<SongResult>,
}

/// `entity=song` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongResult {
    pub wrapper_type: Option<String>,
    pub kind: Option<String>,
    pub artist_id: Option<u64>,
    pub track_id: Option<u64>,
    pub artist_name: Option<String>,
    pub collection_name: Option<String>,
    pub track_name: Option<String>,
    pub artist_view_url: Option<String>,
    pub track_view_url: Option<String>,
    pub preview_url: Option<String>,
    pub artwork_url100: Option<String>,
    pub release_date: Option<String>,
    pub primary_genre_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSearchResponse {
    #[serde(default)]
    pub results: Vec<ArtistResult>,
}

/// `entity=musicArtist` result. Carries no image; only the artist page link.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistResult {
    pub artist_name: String,
    pub artist_id: Option<u64>,
    pub artist_link_url: Option<String>,
    pub primary_genre_name: Option<String>,
}

// ============================================================================
// CONTRACT TESTS
// ============================================================================

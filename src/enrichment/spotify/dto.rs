//! Spotify Web API Data Transfer Objects
//!
//! These types match what the Spotify Web API returns.
//! DO NOT use these types outside the spotify module - convert to domain types.
//!
//! API Reference: https://developer.spotify.com/documentation/web-api

use serde::Deserialize;

/// `/v1/search` response; only the requested `type` is present
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: Option<Paging<TrackObject>>,
    pub artists: Option<Paging<ArtistObject>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SimpleArtist>,
    pub album: Option<AlbumObject>,
    /// 30 second MP3 clip; null for many tracks
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    pub duration_ms: Option<u64>,
    pub popularity: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimpleArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumObject {
    pub id: Option<String>,
    pub name: String,
    pub album_type: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// Full artist object (`/v1/artists/{id}` and artist search items)
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
}

/// `/v1/artists/{id}/top-tracks`
#[derive(Debug, Clone, Deserialize)]
pub struct TopTracksResponse {
    #[serde(default)]
    pub tracks: Vec<TrackObject>,
}

/// `/v1/audio-features/{id}` (deprecated for new apps, may answer 403)
#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesObject {
    pub id: Option<String>,
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub valence: f64,
    pub key: Option<i32>,
    pub mode: Option<i32>,
    pub time_signature: Option<i32>,
}

// ============================================================================
// CONTRACT TESTS
// ============================================================================

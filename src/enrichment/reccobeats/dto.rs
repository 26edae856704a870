//! ReccoBeats API Data Transfer Objects
//!
//! API Reference: https://reccobeats.com/docs/apis

use serde::Deserialize;

/// `GET /v1/track?ids=...`
#[derive(Debug, Clone, Deserialize)]
pub struct TrackListResponse {
    #[serde(default)]
    pub content: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// ReccoBeats' own id (not the Spotify id)
    pub id: String,
    pub track_title: Option<String>,
    /// Spotify track URL
    pub href: Option<String>,
}

/// `GET /v1/track/{id}/audio-features` and `POST /v1/analysis/audio-features`
#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeatures {
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
}

// ============================================================================
// CONTRACT TESTS
// ============================================================================

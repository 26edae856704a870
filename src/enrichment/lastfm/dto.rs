//! Last.fm API Data Transfer Objects
//!
//! API Reference: https://www.last.fm/api
//!
//! Last.fm reports errors as `{"error": N, "message": "..."}`, sometimes
//! with a 200 status, so every response is parsed through [`Envelope`].

use serde::Deserialize;

/// Either an error object or the expected payload
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Error(ApiError),
    Ok(T),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: i32,
    pub message: String,
}

/// `track.getInfo`
#[derive(Debug, Clone, Deserialize)]
pub struct TrackInfoResponse {
    pub track: TrackInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackInfo {
    pub name: String,
    pub url: Option<String>,
    pub mbid: Option<String>,
    pub artist: Option<TrackArtist>,
    pub toptags: Option<TagList>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackArtist {
    pub name: String,
    pub url: Option<String>,
}

/// `artist.getTopTags`
#[derive(Debug, Clone, Deserialize)]
pub struct TopTagsResponse {
    pub toptags: TagList,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagList {
    #[serde(default)]
    pub tag: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
    /// Present on artist top tags (0-100)
    pub count: Option<u32>,
}

/// `artist.getInfo`
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistInfoResponse {
    pub artist: ArtistInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistInfo {
    pub name: String,
    pub mbid: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub image: Vec<Image>,
    pub tags: Option<TagList>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    #[serde(rename = "#text")]
    pub url: String,
    /// small, medium, large, extralarge, mega
    pub size: String,
}

// ============================================================================
// CONTRACT TESTS
// ============================================================================

//! Core data models for the listening tracker.
//!
//! Defines the primary entities: [`Track`] and [`Artist`].
//!
//! # Database Schema
//!
//! The models map to the following tables:
//! - `tracks` - Tracks observed while listening
//! - `artists` - Artist cache keyed by normalized name
//!
//! Enrichment records (`enriched_metadata`) live in
//! [`crate::enrichment::domain::EnrichedMetadata`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::enrichment::domain::ArtistImageSource;

/// A track the user listened to.
///
/// Identity is immutable once created; artist and title are stored exactly
/// as observed and normalized by consumers.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Track {
    /// Database ID (auto-generated)
    pub id: i64,
    pub title: String,
    /// Raw artist credit, possibly multi-artist ("A & B")
    pub artist: String,
    pub album: Option<String>,
    /// Duration in milliseconds
    pub duration_ms: Option<i64>,
}

/// A cached artist, keyed by normalized name.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Artist {
    /// Normalized name (cache key)
    pub normalized_name: String,
    /// Name as first credited
    pub display_name: String,
    pub image_url: Option<String>,
    pub image_source: Option<ArtistImageSource>,
    pub spotify_id: Option<String>,
    pub musicbrainz_id: Option<String>,
    pub genres: Vec<String>,
    pub country: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Artist {
    pub fn new(display_name: &str) -> Self {
        Self {
            normalized_name: crate::enrichment::artists::artist_key(display_name),
            display_name: display_name.trim().to_string(),
            ..Default::default()
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

//! Internal domain models for metadata enrichment.
//!
//! These types are OUR types - they don't change when external APIs change.
//! Every provider response gets converted into a [`MetadataPatch`](super::merge::MetadataPatch)
//! or one of the small result structs below via that provider's adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single provider lookup.
///
/// Provider clients never let errors escape: network, status and parse failures
/// are converted to [`LookupResult::Error`] at the client boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult<T> {
    /// A validated match
    Success(T),
    /// The provider has no matching record (a valid negative result)
    NotFound,
    /// Transient or infrastructure failure
    Error { message: String, retryable: bool },
    /// Missing credentials (e.g. no Last.fm API key)
    NotConfigured,
    /// The user account backing this provider is disconnected
    NotConnected,
}

impl<T> LookupResult<T> {
    /// Convert a client-internal error into a result variant.
    pub fn from_error(error: EnrichmentError) -> Self {
        match error {
            EnrichmentError::NoMatches => LookupResult::NotFound,
            EnrichmentError::NotConfigured(_) => LookupResult::NotConfigured,
            EnrichmentError::NotConnected => LookupResult::NotConnected,
            other => LookupResult::Error {
                retryable: other.is_retryable(),
                message: other.to_string(),
            },
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LookupResult<U> {
        match self {
            LookupResult::Success(value) => LookupResult::Success(f(value)),
            LookupResult::NotFound => LookupResult::NotFound,
            LookupResult::Error { message, retryable } => LookupResult::Error { message, retryable },
            LookupResult::NotConfigured => LookupResult::NotConfigured,
            LookupResult::NotConnected => LookupResult::NotConnected,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LookupResult::Success(_))
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            LookupResult::Success(_) => "success",
            LookupResult::NotFound => "not_found",
            LookupResult::Error { .. } => "error",
            LookupResult::NotConfigured => "not_configured",
            LookupResult::NotConnected => "not_connected",
        }
    }
}

impl<T> From<Result<T, EnrichmentError>> for LookupResult<T> {
    fn from(result: Result<T, EnrichmentError>) -> Self {
        match result {
            Ok(value) => LookupResult::Success(value),
            Err(e) => LookupResult::from_error(e),
        }
    }
}

/// Errors that can occur inside a provider client
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnrichmentError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("No matches found")]
    NoMatches,

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Circuit open for {0}")]
    CircuitOpen(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Account not connected")]
    NotConnected,
}

impl EnrichmentError {
    /// Whether retrying the same request later could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            EnrichmentError::Network(_) | EnrichmentError::RateLimited => true,
            EnrichmentError::Http { status, .. } => *status == 408 || *status >= 500,
            _ => false,
        }
    }
}

/// Overall enrichment state of a metadata record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrichmentStatus {
    #[default]
    Pending,
    Enriched,
    Failed,
}

impl EnrichmentStatus {
    /// Convert to string representation for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentStatus::Pending => "PENDING",
            EnrichmentStatus::Enriched => "ENRICHED",
            EnrichmentStatus::Failed => "FAILED",
        }
    }
}

impl std::str::FromStr for EnrichmentStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ENRICHED" => EnrichmentStatus::Enriched,
            "FAILED" => EnrichmentStatus::Failed,
            _ => EnrichmentStatus::Pending,
        })
    }
}

/// Spotify has its own sub-state because it depends on the user's connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpotifyEnrichmentStatus {
    #[default]
    NotAttempted,
    Enriched,
    NotFound,
    Failed,
    /// Skipped because the account was not connected
    Skipped,
}

impl SpotifyEnrichmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotifyEnrichmentStatus::NotAttempted => "NOT_ATTEMPTED",
            SpotifyEnrichmentStatus::Enriched => "ENRICHED",
            SpotifyEnrichmentStatus::NotFound => "NOT_FOUND",
            SpotifyEnrichmentStatus::Failed => "FAILED",
            SpotifyEnrichmentStatus::Skipped => "SKIPPED",
        }
    }
}

impl std::str::FromStr for SpotifyEnrichmentStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ENRICHED" => SpotifyEnrichmentStatus::Enriched,
            "NOT_FOUND" => SpotifyEnrichmentStatus::NotFound,
            "FAILED" => SpotifyEnrichmentStatus::Failed,
            "SKIPPED" => SpotifyEnrichmentStatus::Skipped,
            _ => SpotifyEnrichmentStatus::NotAttempted,
        })
    }
}

/// Provenance of the stored album art, ordered from least to most trusted.
///
/// The derive order IS the ranking: `None < Local < Deezer < ITunes < Spotify`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlbumArtSource {
    #[default]
    None,
    Local,
    Deezer,
    ITunes,
    Spotify,
}

impl AlbumArtSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumArtSource::None => "NONE",
            AlbumArtSource::Local => "LOCAL",
            AlbumArtSource::Deezer => "DEEZER",
            AlbumArtSource::ITunes => "ITUNES",
            AlbumArtSource::Spotify => "SPOTIFY",
        }
    }

    /// Numeric rank used for arbitration.
    pub fn priority(&self) -> u8 {
        *self as u8
    }

    /// Whether art from `candidate` at `candidate_url` may overwrite art from `self`.
    ///
    /// Never downgrades: the candidate must rank at least as high, and its URL
    /// must be non-blank.
    pub fn should_be_replaced_by(&self, candidate: AlbumArtSource, candidate_url: &str) -> bool {
        !candidate_url.trim().is_empty() && candidate.priority() >= self.priority()
    }
}

impl std::str::FromStr for AlbumArtSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "LOCAL" => AlbumArtSource::Local,
            "DEEZER" => AlbumArtSource::Deezer,
            "ITUNES" => AlbumArtSource::ITunes,
            "SPOTIFY" => AlbumArtSource::Spotify,
            _ => AlbumArtSource::None,
        })
    }
}

/// Which provider an artist image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtistImageSource {
    Spotify,
    Deezer,
    ITunes,
    LastFm,
}

impl ArtistImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtistImageSource::Spotify => "SPOTIFY",
            ArtistImageSource::Deezer => "DEEZER",
            ArtistImageSource::ITunes => "ITUNES",
            ArtistImageSource::LastFm => "LASTFM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SPOTIFY" => Some(ArtistImageSource::Spotify),
            "DEEZER" => Some(ArtistImageSource::Deezer),
            "ITUNES" => Some(ArtistImageSource::ITunes),
            "LASTFM" => Some(ArtistImageSource::LastFm),
            _ => None,
        }
    }
}

/// Where an audio-features blob came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioFeaturesSource {
    Spotify,
    ReccoBeats,
    /// ReccoBeats analysis of the uploaded preview clip
    ReccoBeatsAnalysis,
    /// Averaged from the artist's top tracks
    SpotifyArtistDerived,
}

impl AudioFeaturesSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFeaturesSource::Spotify => "SPOTIFY",
            AudioFeaturesSource::ReccoBeats => "RECCOBEATS",
            AudioFeaturesSource::ReccoBeatsAnalysis => "RECCOBEATS_ANALYSIS",
            AudioFeaturesSource::SpotifyArtistDerived => "SPOTIFY_ARTIST_DERIVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SPOTIFY" => Some(AudioFeaturesSource::Spotify),
            "RECCOBEATS" => Some(AudioFeaturesSource::ReccoBeats),
            "RECCOBEATS_ANALYSIS" => Some(AudioFeaturesSource::ReccoBeatsAnalysis),
            "SPOTIFY_ARTIST_DERIVED" => Some(AudioFeaturesSource::SpotifyArtistDerived),
            _ => None,
        }
    }
}

/// Audio features for a track, stored on the record as a JSON blob
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    /// Decibels, typically -60..0
    pub loudness: f64,
    pub speechiness: f64,
    /// Beats per minute
    pub tempo: f64,
    pub valence: f64,
    /// Pitch class (0 = C, 11 = B)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<i32>,
    /// 1 = major, 0 = minor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<i32>,
}

impl AudioFeatures {
    pub fn to_json(&self) -> String {
        // Serializing plain f64/i32 fields cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(features) => Some(features),
            Err(e) => {
                tracing::warn!("Malformed audio features blob: {}", e);
                None
            }
        }
    }
}

/// Identity of the track being searched for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackQuery {
    pub title: String,
    /// Raw artist credit, possibly "A & B feat. C"
    pub artist: String,
    pub album: Option<String>,
}

impl TrackQuery {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, album: Option<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.filter(|a| !a.trim().is_empty()),
        }
    }

    pub fn primary_artist(&self) -> String {
        super::artists::primary_artist(&self.artist)
    }

    /// Title without version suffixes, for search queries
    pub fn clean_title(&self) -> String {
        super::matching::clean_title(&self.title)
    }

    /// Best similarity between our artist credit and a candidate's credited names.
    pub fn artist_similarity(&self, candidate_names: &[String]) -> f64 {
        if candidate_names.is_empty() {
            return 0.0;
        }
        let joined = candidate_names.join(", ");
        let mut best = super::matching::similarity(&self.artist, &joined);
        for ours in super::artists::parse_artists(&self.artist) {
            for theirs in candidate_names {
                best = best.max(super::matching::similarity(&ours, theirs));
            }
        }
        best
    }

    /// Title and artist scores for a candidate.
    pub fn score(&self, title: &str, artist_names: &[String]) -> super::matching::MatchScore {
        let title_score = super::matching::similarity(&self.title, title)
            .max(super::matching::similarity(&self.clean_title(), title));
        super::matching::MatchScore {
            title: title_score,
            artist: self.artist_similarity(artist_names),
        }
    }
}

impl From<&crate::model::Track> for TrackQuery {
    fn from(track: &crate::model::Track) -> Self {
        Self::new(track.title.clone(), track.artist.clone(), track.album.clone())
    }
}

/// An artist image resolved by one provider
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistImage {
    pub url: String,
    pub source: ArtistImageSource,
    pub spotify_id: Option<String>,
    pub genres: Vec<String>,
}

impl ArtistImage {
    pub fn new(url: impl Into<String>, source: ArtistImageSource) -> Self {
        Self {
            url: url.into(),
            source,
            spotify_id: None,
            genres: Vec::new(),
        }
    }
}

/// The enriched metadata record for one track (1:1 with track id)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EnrichedMetadata {
    pub track_id: i64,

    // MusicBrainz
    pub musicbrainz_recording_id: Option<String>,
    pub musicbrainz_artist_id: Option<String>,
    pub musicbrainz_release_id: Option<String>,
    pub musicbrainz_release_group_id: Option<String>,
    pub album_title: Option<String>,
    pub release_date: Option<String>,
    pub release_year: Option<i32>,
    pub musicbrainz_tags: Vec<String>,
    pub musicbrainz_genres: Vec<String>,
    pub record_label: Option<String>,

    // Spotify
    pub spotify_track_id: Option<String>,
    pub spotify_artist_ids: Vec<String>,
    pub spotify_track_url: Option<String>,
    pub spotify_verified_artist_name: Option<String>,
    pub spotify_artist_image_url: Option<String>,

    // iTunes
    pub itunes_artist_image_url: Option<String>,
    pub apple_music_url: Option<String>,

    // Deezer
    pub deezer_artist_image_url: Option<String>,

    // Last.fm
    pub lastfm_tags: Vec<String>,
    pub lastfm_artist_image_url: Option<String>,
    pub lastfm_url: Option<String>,

    // Audio features
    pub audio_features_json: Option<String>,
    pub audio_features_source: Option<AudioFeaturesSource>,

    // Cross-cutting
    pub album_art_url: Option<String>,
    pub album_art_small_url: Option<String>,
    pub album_art_large_url: Option<String>,
    pub album_art_source: AlbumArtSource,
    pub preview_url: Option<String>,

    // Bookkeeping
    pub enrichment_status: EnrichmentStatus,
    pub spotify_enrichment_status: SpotifyEnrichmentStatus,
    pub retry_count: i64,
    pub last_enrichment_attempt: Option<DateTime<Utc>>,
    pub cache_timestamp: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl EnrichedMetadata {
    /// A fresh record for a newly observed track.
    pub fn new_pending(track_id: i64) -> Self {
        Self {
            track_id,
            ..Default::default()
        }
    }

    /// Genres with MusicBrainz genres preferred, then MusicBrainz tags, then Last.fm tags.
    pub fn genres(&self) -> &[String] {
        if !self.musicbrainz_genres.is_empty() {
            &self.musicbrainz_genres
        } else if !self.musicbrainz_tags.is_empty() {
            &self.musicbrainz_tags
        } else {
            &self.lastfm_tags
        }
    }

    /// Best available artist image, in provider preference order.
    pub fn artist_image_url(&self) -> Option<&str> {
        [
            &self.spotify_artist_image_url,
            &self.itunes_artist_image_url,
            &self.deezer_artist_image_url,
            &self.lastfm_artist_image_url,
        ]
        .into_iter()
        .filter_map(|url| url.as_deref())
        .find(|url| !url.trim().is_empty())
    }

    pub fn audio_features(&self) -> Option<AudioFeatures> {
        self.audio_features_json
            .as_deref()
            .and_then(AudioFeatures::from_json)
    }

    /// Whether any provider has contributed anything to this record.
    pub fn has_any_data(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.album_art_url)
            || present(&self.preview_url)
            || present(&self.audio_features_json)
            || present(&self.musicbrainz_recording_id)
            || present(&self.spotify_track_id)
            || present(&self.apple_music_url)
            || present(&self.lastfm_url)
            || !self.genres().is_empty()
            || self.artist_image_url().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_album_art_source_ordering() {
        assert!(AlbumArtSource::None < AlbumArtSource::Local);
        assert!(AlbumArtSource::Local < AlbumArtSource::Deezer);
        assert!(AlbumArtSource::Deezer < AlbumArtSource::ITunes);
        assert!(AlbumArtSource::ITunes < AlbumArtSource::Spotify);
    }

    #[test]
    fn test_should_be_replaced_by() {
        let current = AlbumArtSource::ITunes;
        assert!(current.should_be_replaced_by(AlbumArtSource::Spotify, "https://x/a.jpg"));
        assert!(current.should_be_replaced_by(AlbumArtSource::ITunes, "https://x/b.jpg"));
        assert!(!current.should_be_replaced_by(AlbumArtSource::Deezer, "https://x/c.jpg"));
        // Blank URLs never win, even from a higher source
        assert!(!current.should_be_replaced_by(AlbumArtSource::Spotify, "   "));
    }

    #[test]
    fn test_status_roundtrip_strings() {
        for status in [
            EnrichmentStatus::Pending,
            EnrichmentStatus::Enriched,
            EnrichmentStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<EnrichmentStatus>().unwrap(), status);
        }
        assert_eq!(
            "garbage".parse::<AlbumArtSource>().unwrap(),
            AlbumArtSource::None
        );
    }

    #[test]
    fn test_lookup_result_from_error() {
        let not_found: LookupResult<()> = LookupResult::from_error(EnrichmentError::NoMatches);
        assert_eq!(not_found, LookupResult::NotFound);

        let timeout: LookupResult<()> =
            LookupResult::from_error(EnrichmentError::Network("timeout".into()));
        assert!(matches!(timeout, LookupResult::Error { retryable: true, .. }));

        let bad_request: LookupResult<()> = LookupResult::from_error(EnrichmentError::Http {
            status: 400,
            message: "Bad Request".into(),
        });
        assert!(matches!(bad_request, LookupResult::Error { retryable: false, .. }));
    }

    #[test]
    fn test_genres_fallback_order() {
        let mut meta = EnrichedMetadata::new_pending(1);
        assert!(meta.genres().is_empty());
        meta.lastfm_tags = vec!["synthpop".into()];
        assert_eq!(meta.genres(), ["synthpop".to_string()]);
        meta.musicbrainz_genres = vec!["synth-pop".into()];
        assert_eq!(meta.genres(), ["synth-pop".to_string()]);
    }

    #[test]
    fn test_audio_features_json() {
        let features = AudioFeatures {
            energy: 0.73,
            key: Some(1),
            ..Default::default()
        };
        let parsed = AudioFeatures::from_json(&features.to_json()).unwrap();
        assert_eq!(parsed, features);
        assert!(AudioFeatures::from_json("{not json").is_none());
    }
}

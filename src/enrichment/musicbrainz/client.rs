//! MusicBrainz HTTP client
//!
//! Handles communication with the MusicBrainz web service.
//! See: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! IMPORTANT: MusicBrainz requires a User-Agent header and rate limits to 1 req/sec.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{adapter, dto};
use crate::enrichment::domain::{EnrichmentError, LookupResult, TrackQuery};
use crate::enrichment::http::{self, ProviderGuard, ProviderSettings};
use crate::enrichment::matching::dedupe_queries;
use crate::enrichment::merge::MetadataPatch;

const BASE_URL: &str = "https://musicbrainz.org/ws/2";

/// 1 request per second plus margin
pub const MIN_INTERVAL: Duration = Duration::from_millis(1100);

/// Genres, country and id for an artist
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MusicBrainzArtist {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    pub genres: Vec<String>,
}

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
    guard: ProviderGuard,
}

impl MusicBrainzClient {
    /// Create a new client
    pub fn new(timeout: Duration) -> Result<Self, EnrichmentError> {
        Self::build(timeout, BASE_URL)
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, EnrichmentError> {
        Self::build(http::DEFAULT_TIMEOUT, base_url)
    }

    fn build(timeout: Duration, base_url: impl Into<String>) -> Result<Self, EnrichmentError> {
        Ok(Self {
            http_client: http::build_client(http::USER_AGENT, timeout)?,
            base_url: base_url.into(),
            guard: ProviderGuard::new(ProviderSettings::new("musicbrainz", MIN_INTERVAL)),
        })
    }

    /// Find the recording and return ids, release info, genres, tags and label.
    ///
    /// Falls back to the artist's genres when the recording has none.
    pub async fn enrich_track(&self, query: &TrackQuery) -> LookupResult<MetadataPatch> {
        self.enrich_track_inner(query).await.into()
    }

    /// Look up an artist by MBID.
    pub async fn lookup_artist(&self, artist_id: &str) -> LookupResult<MusicBrainzArtist> {
        self.lookup_artist_inner(artist_id).await.into()
    }

    async fn enrich_track_inner(&self, query: &TrackQuery) -> Result<MetadataPatch, EnrichmentError> {
        let recording_id = self.search_recording(query).await?;
        let recording = self.lookup_recording(&recording_id).await?;
        let mut patch = adapter::to_patch(&recording);

        if patch.musicbrainz_genres.is_empty()
            && patch.musicbrainz_tags.is_empty()
            && let Some(artist_id) = patch.musicbrainz_artist_id.clone()
        {
            match self.lookup_artist_inner(&artist_id).await {
                Ok(artist) => patch.musicbrainz_genres = artist.genres,
                Err(e) => debug!("MusicBrainz artist genre fallback failed: {}", e),
            }
        }

        if let Some(release_id) = patch.musicbrainz_release_id.clone() {
            match self.lookup_release_label(&release_id).await {
                Ok(label) => patch.record_label = label,
                Err(e) => debug!("MusicBrainz label lookup failed: {}", e),
            }
        }

        Ok(patch)
    }

    /// Search with progressively looser Lucene queries
    async fn search_recording(&self, query: &TrackQuery) -> Result<String, EnrichmentError> {
        for lucene in search_strategies(query) {
            let url = format!(
                "{}/recording?query={}&fmt=json&limit=10",
                self.base_url,
                urlencoding::encode(&lucene)
            );
            let response: dto::SearchResponse = match self.get(&url, "recording search").await {
                Ok(response) => response,
                Err(EnrichmentError::NoMatches) => continue,
                Err(e) => return Err(e),
            };
            if let Some(recording) = adapter::select_recording(query, &response.recordings) {
                debug!("MusicBrainz matched recording {} via {:?}", recording.id, lucene);
                return Ok(recording.id.clone());
            }
            debug!("MusicBrainz: no validated match for {:?}", lucene);
        }
        Err(EnrichmentError::NoMatches)
    }

    async fn lookup_recording(
        &self,
        recording_id: &str,
    ) -> Result<dto::RecordingResponse, EnrichmentError> {
        let url = format!(
            "{}/recording/{}?fmt=json&inc=artist-credits+releases+release-groups+genres+tags",
            self.base_url, recording_id
        );
        self.get(&url, "recording lookup").await
    }

    async fn lookup_artist_inner(
        &self,
        artist_id: &str,
    ) -> Result<MusicBrainzArtist, EnrichmentError> {
        let url = format!(
            "{}/artist/{}?fmt=json&inc=genres+tags",
            self.base_url, artist_id
        );
        let artist: dto::ArtistResponse = self.get(&url, "artist lookup").await?;
        let mut genres = adapter::extract_tags(&artist.genres);
        if genres.is_empty() {
            genres = adapter::extract_tags(&artist.tags);
        }
        Ok(MusicBrainzArtist {
            id: artist.id,
            name: artist.name,
            country: artist.country,
            genres,
        })
    }

    async fn lookup_release_label(
        &self,
        release_id: &str,
    ) -> Result<Option<String>, EnrichmentError> {
        let url = format!("{}/release/{}?fmt=json&inc=labels", self.base_url, release_id);
        let release: dto::ReleaseResponse = self.get(&url, "release lookup").await?;
        Ok(adapter::label_name(&release))
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, label: &str) -> Result<T, EnrichmentError> {
        self.guard
            .call(label, || http::send_json::<T>(self.http_client.get(url)))
            .await
    }
}

/// Escape Lucene special characters inside a quoted phrase
fn escape_lucene(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        if matches!(ch, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Lucene queries from most to least precise.
pub fn search_strategies(query: &TrackQuery) -> Vec<String> {
    let title = escape_lucene(&query.title);
    let clean = escape_lucene(&query.clean_title());
    let artist = escape_lucene(&query.primary_artist());

    let mut strategies = Vec::new();
    if let Some(album) = &query.album {
        strategies.push(format!(
            "recording:\"{}\" AND artist:\"{}\" AND release:\"{}\"",
            title,
            artist,
            escape_lucene(album)
        ));
    }
    strategies.push(format!("recording:\"{}\" AND artist:\"{}\"", title, artist));
    strategies.push(format!("recording:\"{}\" AND artist:\"{}\"", clean, artist));
    strategies.push(format!("recording:\"{}\"", clean));
    dedupe_queries(strategies)
}

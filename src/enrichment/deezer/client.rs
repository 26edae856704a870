//! Deezer HTTP client

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{adapter, dto};
use crate::enrichment::domain::{ArtistImage, EnrichmentError, LookupResult, TrackQuery};
use crate::enrichment::http::{self, ProviderGuard, ProviderSettings};
use crate::enrichment::matching::dedupe_queries;
use crate::enrichment::merge::MetadataPatch;

const BASE_URL: &str = "https://api.deezer.com";

/// Deezer allows 50 requests per 5 seconds
pub const MIN_INTERVAL: Duration = Duration::from_millis(200);

const SEARCH_LIMIT: u32 = 10;

/// Deezer API client
pub struct DeezerClient {
    http_client: reqwest::Client,
    base_url: String,
    guard: ProviderGuard,
}

impl DeezerClient {
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
            guard: ProviderGuard::new(ProviderSettings::new("deezer", MIN_INTERVAL)),
        })
    }

    /// Search for the track: album art, preview URL and artist picture.
    pub async fn search_track(&self, query: &TrackQuery) -> LookupResult<MetadataPatch> {
        self.search_track_inner(query).await.into()
    }

    pub async fn find_artist_image(&self, artist: &str) -> LookupResult<ArtistImage> {
        self.find_artist_image_inner(artist).await.into()
    }

    async fn search_track_inner(&self, query: &TrackQuery) -> Result<MetadataPatch, EnrichmentError> {
        for q in search_strategies(query) {
            let url = format!(
                "{}/search?q={}&limit={}",
                self.base_url,
                urlencoding::encode(&q),
                SEARCH_LIMIT
            );
            let response: dto::SearchResponse<dto::Track> =
                match self.get(&url, "track search").await {
                    Ok(response) => response,
                    Err(EnrichmentError::NoMatches) => continue,
                    Err(e) => return Err(e),
                };
            if let Some(track) = adapter::select_track(query, &response.data) {
                debug!("Deezer matched '{}' via {:?}", track.title, q);
                return Ok(adapter::to_patch(track));
            }
            debug!("Deezer: no validated match for {:?}", q);
        }
        Err(EnrichmentError::NoMatches)
    }

    async fn find_artist_image_inner(&self, artist: &str) -> Result<ArtistImage, EnrichmentError> {
        let url = format!(
            "{}/search/artist?q={}&limit=5",
            self.base_url,
            urlencoding::encode(artist.trim())
        );
        let response: dto::SearchResponse<dto::Artist> = self.get(&url, "artist search").await?;
        adapter::select_artist_image(artist, &response.data).ok_or(EnrichmentError::NoMatches)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, label: &str) -> Result<T, EnrichmentError> {
        // Error bodies go through the guard so quota errors are retried
        self.guard
            .call(label, || async move {
                match http::send_json::<dto::Envelope<T>>(self.http_client.get(url)).await? {
                    dto::Envelope::Ok(value) => Ok(value),
                    dto::Envelope::Error { error } => Err(adapter::to_error(&error)),
                }
            })
            .await
    }
}

/// Advanced-search queries from most to least precise.
pub fn search_strategies(query: &TrackQuery) -> Vec<String> {
    let artist = query.primary_artist();
    let title = query.clean_title();
    dedupe_queries([
        format!("artist:\"{}\" track:\"{}\"", artist, query.title.trim()),
        format!("artist:\"{}\" track:\"{}\"", artist, title),
        format!("{} {}", artist, title),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = DeezerClient::new(http::DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url, "https://api.deezer.com");
    }

    #[test]
    fn test_search_strategies() {
        let query = TrackQuery::new("Blinding Lights", "The Weeknd", None);
        assert_eq!(
            search_strategies(&query),
            vec![
                "artist:\"The Weeknd\" track:\"Blinding Lights\"",
                "The Weeknd Blinding Lights",
            ]
        );
    }
}

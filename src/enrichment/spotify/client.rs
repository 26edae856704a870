//! Spotify Web API client
//!
//! Every request needs a bearer token from [`SpotifyAuth`]. A disconnected
//! account short-circuits to [`LookupResult::NotConnected`] without touching
//! the network, and a 401 is reported the same way.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::auth::SpotifyAuth;
use super::{adapter, dto};
use crate::enrichment::domain::{
    ArtistImage, AudioFeatures, AudioFeaturesSource, EnrichmentError, LookupResult, TrackQuery,
};
use crate::enrichment::http::{self, ProviderGuard, ProviderSettings};
use crate::enrichment::matching::dedupe_queries;
use crate::enrichment::merge::MetadataPatch;

const BASE_URL: &str = "https://api.spotify.com/v1";

/// Courtesy delay between requests
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

const SEARCH_LIMIT: u32 = 10;

/// Spotify API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    base_url: String,
    auth: Arc<dyn SpotifyAuth>,
    guard: ProviderGuard,
}

impl SpotifyClient {
    /// Create a new client
    pub fn new(auth: Arc<dyn SpotifyAuth>, timeout: Duration) -> Result<Self, EnrichmentError> {
        Self::build(auth, timeout, BASE_URL)
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(
        auth: Arc<dyn SpotifyAuth>,
        base_url: impl Into<String>,
    ) -> Result<Self, EnrichmentError> {
        Self::build(auth, http::DEFAULT_TIMEOUT, base_url)
    }

    fn build(
        auth: Arc<dyn SpotifyAuth>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Result<Self, EnrichmentError> {
        Ok(Self {
            http_client: http::build_client(http::USER_AGENT, timeout)?,
            base_url: base_url.into(),
            auth,
            guard: ProviderGuard::new(ProviderSettings::new("spotify", MIN_INTERVAL)),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.auth.is_connected()
    }

    /// Search for the track and return what Spotify knows about it.
    pub async fn search_track(&self, query: &TrackQuery) -> LookupResult<MetadataPatch> {
        self.search_track_inner(query).await.into()
    }

    /// Resolve an image for an artist: artist search first, then the artist
    /// credited on matching tracks.
    pub async fn find_artist_image(&self, artist: &str) -> LookupResult<ArtistImage> {
        self.find_artist_image_inner(artist).await.into()
    }

    /// Image for a known Spotify artist id.
    pub async fn artist_image(&self, artist_id: &str) -> LookupResult<ArtistImage> {
        self.artist_image_inner(artist_id).await.into()
    }

    /// Ids of the artist's top tracks.
    pub async fn artist_top_tracks(&self, artist_id: &str) -> LookupResult<Vec<String>> {
        self.artist_top_tracks_inner(artist_id).await.into()
    }

    /// Audio features for a track. The endpoint is deprecated for new
    /// applications; a 403 is reported as not found.
    pub async fn audio_features(
        &self,
        track_id: &str,
    ) -> LookupResult<(AudioFeatures, AudioFeaturesSource)> {
        self.audio_features_inner(track_id).await.into()
    }

    async fn search_track_inner(&self, query: &TrackQuery) -> Result<MetadataPatch, EnrichmentError> {
        let token = self.token().await?;

        for q in search_strategies(query) {
            let url = format!(
                "{}/search?q={}&type=track&limit={}",
                self.base_url,
                urlencoding::encode(&q),
                SEARCH_LIMIT
            );
            let response: dto::SearchResponse = match self.get(&token, &url, "track search").await {
                Ok(response) => response,
                Err(EnrichmentError::NoMatches) => continue,
                Err(e) => return Err(e),
            };
            let items = response.tracks.map(|p| p.items).unwrap_or_default();
            if let Some(track) = adapter::select_track(query, &items) {
                debug!("Spotify matched '{}' with query {:?}", track.name, q);
                return Ok(adapter::to_patch(track));
            }
            debug!("Spotify: no validated match for query {:?}", q);
        }

        Err(EnrichmentError::NoMatches)
    }

    async fn find_artist_image_inner(&self, artist: &str) -> Result<ArtistImage, EnrichmentError> {
        let token = self.token().await?;
        let artist_query = format!("artist:\"{}\"", artist.trim());

        let url = format!(
            "{}/search?q={}&type=artist&limit=5",
            self.base_url,
            urlencoding::encode(&artist_query)
        );
        match self.get::<dto::SearchResponse>(&token, &url, "artist search").await {
            Ok(response) => {
                let items = response.artists.map(|p| p.items).unwrap_or_default();
                if let Some(found) = adapter::select_artist(artist, &items)
                    && let Some(image) = adapter::to_artist_image(found)
                {
                    return Ok(image);
                }
            }
            Err(EnrichmentError::NoMatches) => {}
            Err(e) => return Err(e),
        }

        debug!("Spotify: deriving artist '{}' from track search", artist);
        let url = format!(
            "{}/search?q={}&type=track&limit={}",
            self.base_url,
            urlencoding::encode(&artist_query),
            SEARCH_LIMIT
        );
        let response: dto::SearchResponse = self.get(&token, &url, "artist track search").await?;
        let items = response.tracks.map(|p| p.items).unwrap_or_default();
        let artist_id =
            adapter::artist_id_from_tracks(artist, &items).ok_or(EnrichmentError::NoMatches)?;
        self.artist_image_with_token(&token, &artist_id).await
    }

    async fn artist_image_inner(&self, artist_id: &str) -> Result<ArtistImage, EnrichmentError> {
        let token = self.token().await?;
        self.artist_image_with_token(&token, artist_id).await
    }

    async fn artist_image_with_token(
        &self,
        token: &str,
        artist_id: &str,
    ) -> Result<ArtistImage, EnrichmentError> {
        let url = format!("{}/artists/{}", self.base_url, urlencoding::encode(artist_id));
        let artist: dto::ArtistObject = self.get(token, &url, "artist").await?;
        adapter::to_artist_image(&artist).ok_or(EnrichmentError::NoMatches)
    }

    async fn artist_top_tracks_inner(&self, artist_id: &str) -> Result<Vec<String>, EnrichmentError> {
        let token = self.token().await?;
        let url = format!(
            "{}/artists/{}/top-tracks?market=US",
            self.base_url,
            urlencoding::encode(artist_id)
        );
        let response: dto::TopTracksResponse = self.get(&token, &url, "top tracks").await?;
        let ids: Vec<String> = response.tracks.into_iter().map(|t| t.id).collect();
        if ids.is_empty() {
            return Err(EnrichmentError::NoMatches);
        }
        Ok(ids)
    }

    async fn audio_features_inner(
        &self,
        track_id: &str,
    ) -> Result<(AudioFeatures, AudioFeaturesSource), EnrichmentError> {
        let token = self.token().await?;
        let url = format!(
            "{}/audio-features/{}",
            self.base_url,
            urlencoding::encode(track_id)
        );
        match self.get::<dto::AudioFeaturesObject>(&token, &url, "audio features").await {
            Ok(features) => Ok(adapter::to_audio_features(&features)),
            Err(EnrichmentError::Http { status: 403, .. }) => {
                debug!("Spotify audio-features endpoint refused (403)");
                Err(EnrichmentError::NoMatches)
            }
            Err(e) => Err(e),
        }
    }

    async fn token(&self) -> Result<String, EnrichmentError> {
        if !self.auth.is_connected() {
            return Err(EnrichmentError::NotConnected);
        }
        self.auth
            .access_token()
            .await
            .ok_or(EnrichmentError::NotConnected)
    }

    /// Authorized GET through the provider guard
    async fn get<T: DeserializeOwned>(
        &self,
        token: &str,
        url: &str,
        label: &str,
    ) -> Result<T, EnrichmentError> {
        self.guard
            .call(label, || {
                http::send_json::<T>(self.http_client.get(url).bearer_auth(token))
            })
            .await
            .map_err(|e| match e {
                EnrichmentError::Http { status: 401, .. } => EnrichmentError::NotConnected,
                other => other,
            })
    }
}

/// Query variants from most to least precise.
pub fn search_strategies(query: &TrackQuery) -> Vec<String> {
    let artist = query.primary_artist();
    let title = query.clean_title();
    dedupe_queries([
        format!("track:\"{}\" artist:\"{}\"", query.title.trim(), artist),
        format!("track:\"{}\" artist:\"{}\"", title, artist),
        format!("{} {}", artist, title),
        title.clone(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::spotify::StaticSpotifyAuth;

    #[test]
    fn test_search_strategies_are_deduplicated() {
        let query = TrackQuery::new("Blinding Lights", "The Weeknd", None);
        assert_eq!(
            search_strategies(&query),
            vec![
                "track:\"Blinding Lights\" artist:\"The Weeknd\"",
                "The Weeknd Blinding Lights",
                "Blinding Lights",
            ]
        );
    }

    #[test]
    fn test_search_strategies_use_primary_artist_and_clean_title() {
        let query = TrackQuery::new("Stay (feat. Justin Bieber)", "The Kid LAROI & Justin Bieber", None);
        let strategies = search_strategies(&query);
        assert_eq!(strategies.len(), 4);
        assert_eq!(strategies[1], "track:\"Stay\" artist:\"The Kid LAROI\"");
        assert_eq!(strategies[3], "Stay");
    }

    #[tokio::test]
    async fn test_disconnected_short_circuits() {
        // Unroutable base URL: any network call would fail with an error, not NotConnected
        let client = SpotifyClient::with_base_url(
            Arc::new(StaticSpotifyAuth::disconnected()),
            "http://127.0.0.1:9",
        )
        .unwrap();
        let query = TrackQuery::new("Blinding Lights", "The Weeknd", None);
        assert_eq!(client.search_track(&query).await, LookupResult::NotConnected);
        assert_eq!(
            client.find_artist_image("The Weeknd").await,
            LookupResult::NotConnected
        );
    }

    #[test]
    fn test_client_creation() {
        let client =
            SpotifyClient::new(Arc::new(StaticSpotifyAuth::disconnected()), http::DEFAULT_TIMEOUT)
                .unwrap();
        assert_eq!(client.base_url, BASE_URL);
        assert!(!client.is_connected());
    }
}

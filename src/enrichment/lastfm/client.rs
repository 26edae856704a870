//! Last.fm HTTP client
//!
//! All calls go to the single `2.0/` endpoint with a `method` parameter and
//! require an API key. Without one every lookup reports `NotConfigured`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{adapter, dto};
use crate::enrichment::domain::{ArtistImage, EnrichmentError, LookupResult, TrackQuery};
use crate::enrichment::http::{self, ProviderGuard, ProviderSettings};
use crate::enrichment::merge::MetadataPatch;

const BASE_URL: &str = "https://ws.audioscrobbler.com/2.0";

/// Last.fm asks for no more than 5 requests per second
pub const MIN_INTERVAL: Duration = Duration::from_millis(250);

/// Last.fm API client
pub struct LastFmClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    guard: ProviderGuard,
}

impl LastFmClient {
    /// Create a new client. A blank key counts as missing.
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, EnrichmentError> {
        Self::build(api_key, timeout, BASE_URL)
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, EnrichmentError> {
        Self::build(api_key, http::DEFAULT_TIMEOUT, base_url)
    }

    fn build(
        api_key: Option<String>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Result<Self, EnrichmentError> {
        Ok(Self {
            http_client: http::build_client(http::USER_AGENT, timeout)?,
            base_url: base_url.into(),
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            guard: ProviderGuard::new(ProviderSettings::new("lastfm", MIN_INTERVAL)),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Community tags for a track, falling back to the artist's top tags.
    pub async fn track_tags(&self, query: &TrackQuery) -> LookupResult<MetadataPatch> {
        self.track_tags_inner(query).await.into()
    }

    /// Artist photo from `artist.getInfo`, never the star placeholder.
    pub async fn artist_image(&self, artist: &str) -> LookupResult<ArtistImage> {
        self.artist_image_inner(artist).await.into()
    }

    async fn track_tags_inner(&self, query: &TrackQuery) -> Result<MetadataPatch, EnrichmentError> {
        let artist = query.primary_artist();
        let params = format!(
            "method=track.getInfo&track={}&artist={}&autocorrect=1",
            urlencoding::encode(query.title.trim()),
            urlencoding::encode(&artist)
        );
        let info: dto::TrackInfoResponse = self.call(&params, "track info").await?;
        let track = info.track;

        let mut tags = track
            .toptags
            .as_ref()
            .map(|t| adapter::filter_tags(&t.tag, &artist))
            .unwrap_or_default();

        if tags.is_empty() {
            debug!("Last.fm: no track tags for '{}', trying artist tags", query.title);
            let credited = track
                .artist
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or(artist);
            tags = self.artist_top_tags(&credited).await?;
        }

        let patch = MetadataPatch {
            lastfm_tags: tags,
            lastfm_url: track.url.filter(|u| !u.trim().is_empty()),
            ..Default::default()
        };
        if patch.is_empty() {
            return Err(EnrichmentError::NoMatches);
        }
        Ok(patch)
    }

    async fn artist_top_tags(&self, artist: &str) -> Result<Vec<String>, EnrichmentError> {
        let params = format!(
            "method=artist.getTopTags&artist={}&autocorrect=1",
            urlencoding::encode(artist)
        );
        match self.call::<dto::TopTagsResponse>(&params, "artist top tags").await {
            Ok(response) => Ok(adapter::filter_tags(&response.toptags.tag, artist)),
            Err(EnrichmentError::NoMatches) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn artist_image_inner(&self, artist: &str) -> Result<ArtistImage, EnrichmentError> {
        let params = format!(
            "method=artist.getInfo&artist={}&autocorrect=1",
            urlencoding::encode(artist.trim())
        );
        let info: dto::ArtistInfoResponse = self.call(&params, "artist info").await?;
        adapter::to_artist_image(&info.artist).ok_or(EnrichmentError::NoMatches)
    }

    /// Call one API method and unwrap the error envelope
    async fn call<T: DeserializeOwned>(&self, params: &str, label: &str) -> Result<T, EnrichmentError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EnrichmentError::NotConfigured("Last.fm API key".into()))?;
        let url = &format!(
            "{}/?{}&api_key={}&format=json",
            self.base_url,
            params,
            urlencoding::encode(api_key)
        );
        self.guard
            .call(label, || async move {
                let envelope = http::send_json::<dto::Envelope<T>>(self.http_client.get(url))
                    .await
                    .map_err(error_from_body)?;
                match envelope {
                    dto::Envelope::Ok(value) => Ok(value),
                    dto::Envelope::Error(error) => Err(adapter::to_error(&error)),
                }
            })
            .await
    }
}

/// Last.fm puts its error object in non-200 bodies too
fn error_from_body(error: EnrichmentError) -> EnrichmentError {
    if let EnrichmentError::Http { message, .. } = &error
        && let Ok(api_error) = serde_json::from_str::<dto::ApiError>(message)
    {
        return adapter::to_error(&api_error);
    }
    error
}

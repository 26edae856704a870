//! ReccoBeats HTTP client
//!
//! Two ways to get audio features: a lookup by Spotify track id, and an
//! analysis endpoint that accepts an uploaded audio clip.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{adapter, dto};
use crate::enrichment::domain::{AudioFeatures, AudioFeaturesSource, EnrichmentError, LookupResult};
use crate::enrichment::http::{self, ProviderGuard, ProviderSettings};

const BASE_URL: &str = "https://api.reccobeats.com";

pub const MIN_INTERVAL: Duration = Duration::from_millis(250);

/// Previews are 30 second clips; anything much larger is not a preview
const MAX_PREVIEW_BYTES: usize = 10 * 1024 * 1024;

/// ReccoBeats API client
pub struct ReccoBeatsClient {
    http_client: reqwest::Client,
    base_url: String,
    guard: ProviderGuard,
}

impl ReccoBeatsClient {
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
            guard: ProviderGuard::new(ProviderSettings::new("reccobeats", MIN_INTERVAL)),
        })
    }

    /// Features for a track ReccoBeats already knows by its Spotify id.
    pub async fn features_by_spotify_id(
        &self,
        spotify_id: &str,
    ) -> LookupResult<(AudioFeatures, AudioFeaturesSource)> {
        self.features_by_spotify_id_inner(spotify_id).await.into()
    }

    /// Download the preview clip and have ReccoBeats analyse it.
    pub async fn analyze_preview(
        &self,
        preview_url: &str,
    ) -> LookupResult<(AudioFeatures, AudioFeaturesSource)> {
        self.analyze_preview_inner(preview_url).await.into()
    }

    async fn features_by_spotify_id_inner(
        &self,
        spotify_id: &str,
    ) -> Result<(AudioFeatures, AudioFeaturesSource), EnrichmentError> {
        let url = format!(
            "{}/v1/track?ids={}",
            self.base_url,
            urlencoding::encode(spotify_id)
        );
        let tracks: dto::TrackListResponse = self.get(&url, "track lookup").await?;
        let track =
            adapter::select_track(spotify_id, &tracks.content).ok_or(EnrichmentError::NoMatches)?;
        debug!("ReccoBeats track {} for Spotify id {}", track.id, spotify_id);

        let url = format!(
            "{}/v1/track/{}/audio-features",
            self.base_url,
            urlencoding::encode(&track.id)
        );
        let features: dto::AudioFeatures = self.get(&url, "audio features").await?;
        Ok(adapter::to_audio_features(&features, AudioFeaturesSource::ReccoBeats))
    }

    async fn analyze_preview_inner(
        &self,
        preview_url: &str,
    ) -> Result<(AudioFeatures, AudioFeaturesSource), EnrichmentError> {
        let audio = self
            .guard
            .call("preview download", || {
                http::send_bytes(self.http_client.get(preview_url))
            })
            .await?;
        if audio.is_empty() {
            return Err(EnrichmentError::NoMatches);
        }
        if audio.len() > MAX_PREVIEW_BYTES {
            return Err(EnrichmentError::Parse(format!(
                "preview too large: {} bytes",
                audio.len()
            )));
        }
        debug!("Uploading {} byte preview for analysis", audio.len());

        let url = &format!("{}/v1/analysis/audio-features", self.base_url);
        let audio = &audio;
        let features: dto::AudioFeatures = self
            .guard
            .call("audio analysis", || async move {
                let part = reqwest::multipart::Part::bytes(audio.clone())
                    .file_name("preview.mp3")
                    .mime_str("audio/mpeg")
                    .map_err(http::network_error)?;
                let form = reqwest::multipart::Form::new().part("audioFile", part);
                http::send_json::<dto::AudioFeatures>(self.http_client.post(url).multipart(form))
                    .await
            })
            .await?;
        Ok(adapter::to_audio_features(
            &features,
            AudioFeaturesSource::ReccoBeatsAnalysis,
        ))
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, label: &str) -> Result<T, EnrichmentError> {
        self.guard
            .call(label, || http::send_json::<T>(self.http_client.get(url)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ReccoBeatsClient::new(http::DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url, "https://api.reccobeats.com");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_reported_as_error() {
        let client = ReccoBeatsClient::with_base_url("http://127.0.0.1:9").unwrap();
        let result = client.features_by_spotify_id("0VjIjW4GlUZAMYd2vXMi3b").await;
        assert!(matches!(result, LookupResult::Error { retryable: true, .. }));
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Draft, EnrichmentSource, SourceOutcome};
use crate::enrichment::domain::{
    EnrichedMetadata, LookupResult, SpotifyEnrichmentStatus, TrackQuery,
};
use crate::enrichment::gap::EnrichmentGap;
use crate::enrichment::merge::MetadataPatch;
use crate::enrichment::traits::SpotifyApi;
use crate::model::Track;
use crate::store::MetadataStore;

/// Spotify: album art, preview, ids, artist image and (when the endpoint
/// still answers) audio features.
pub struct SpotifySource {
    api: Arc<dyn SpotifyApi>,
    store: Arc<dyn MetadataStore>,
}

impl SpotifySource {
    pub fn new(api: Arc<dyn SpotifyApi>, store: Arc<dyn MetadataStore>) -> Self {
        Self { api, store }
    }

    fn status(status: SpotifyEnrichmentStatus) -> MetadataPatch {
        MetadataPatch {
            spotify_status: Some(status),
            ..Default::default()
        }
    }
}

#[async_trait]
impl EnrichmentSource for SpotifySource {
    fn name(&self) -> &'static str {
        "spotify"
    }

    fn priority(&self) -> u8 {
        1
    }

    fn can_provide(&self, gap: EnrichmentGap) -> bool {
        // Disconnected users still get one pass that records SKIPPED
        gap.intersects(
            EnrichmentGap::ALBUM_ART
                | EnrichmentGap::PREVIEW_URL
                | EnrichmentGap::ARTIST_IMAGE
                | EnrichmentGap::AUDIO_FEATURES,
        )
    }

    async fn attempt(&self, track: &Track, current: &EnrichedMetadata) -> SourceOutcome {
        let mut draft = Draft::new(self.name(), current);

        if !self.api.is_connected() {
            debug!("Spotify not connected, skipping track {}", track.id);
            draft.patch(&Self::status(SpotifyEnrichmentStatus::Skipped));
            return draft.finish(self.store.as_ref()).await;
        }

        if current.spotify_track_id.is_some() {
            debug!("Spotify id already known for track {}, skipping search", track.id);
        } else {
            self.search(track, &mut draft).await;
            if draft.current().spotify_track_id.is_none() {
                return draft.finish(self.store.as_ref()).await;
            }
        }

        let gap = draft.gap();
        if gap.missing_artist_image()
            && let Some(artist_id) = draft.current().spotify_artist_ids.first().cloned()
        {
            let image = self.api.artist_image(&artist_id).await;
            draft.apply_artist_image("artist image", image);
        }

        if gap.missing_audio_features()
            && let Some(track_id) = draft.current().spotify_track_id.clone()
        {
            let features = self.api.audio_features(&track_id).await;
            draft.apply_features("audio features", features);
        }

        draft.finish(self.store.as_ref()).await
    }
}

impl SpotifySource {
    /// Track search; every outcome other than a match only records a status.
    async fn search(&self, track: &Track, draft: &mut Draft<'_>) {
        let query = TrackQuery::from(track);
        match self.api.search_track(&query).await {
            LookupResult::Success(patch) => draft.patch(&patch),
            LookupResult::NotFound => draft.patch(&Self::status(SpotifyEnrichmentStatus::NotFound)),
            LookupResult::NotConnected | LookupResult::NotConfigured => {
                draft.patch(&Self::status(SpotifyEnrichmentStatus::Skipped))
            }
            error @ LookupResult::Error { .. } => {
                draft.take("track search", error);
                draft.patch(&Self::status(SpotifyEnrichmentStatus::Failed));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::domain::{AlbumArtSource, AudioFeaturesSource};
    use crate::enrichment::sources::test_support;
    use crate::enrichment::traits::mocks::{MockSpotify, sample_features};

    fn source(api: MockSpotify, store: Arc<dyn MetadataStore>) -> (SpotifySource, Arc<MockSpotify>) {
        let api = Arc::new(api);
        (SpotifySource::new(api.clone(), store), api)
    }

    #[tokio::test]
    async fn test_full_match_fills_art_ids_and_image() {
        let (store, track, record, _dir) = test_support::blinding_lights().await;
        let (source, api) = source(MockSpotify::blinding_lights(), store.clone());

        let updated = source.enrich(&track, &record).await.unwrap();
        assert_eq!(updated.album_art_source, AlbumArtSource::Spotify);
        assert_eq!(updated.spotify_track_id.as_deref(), Some("0VjIjW4GlUZAMYd2vXMi3b"));
        assert_eq!(
            updated.spotify_artist_image_url.as_deref(),
            Some("https://i.scdn.co/image/weeknd")
        );
        assert_eq!(updated.spotify_enrichment_status, SpotifyEnrichmentStatus::Enriched);
        assert_eq!(api.artist_calls.count(), 1);

        let stored = store.get(track.id).await.unwrap().unwrap();
        assert_eq!(stored.preview_url, updated.preview_url);
    }

    #[tokio::test]
    async fn test_audio_features_when_endpoint_answers() {
        let (store, track, record, _dir) = test_support::blinding_lights().await;
        let mock = MockSpotify {
            features: LookupResult::Success((sample_features(0.73), AudioFeaturesSource::Spotify)),
            ..MockSpotify::blinding_lights()
        };
        let (source, _) = source(mock, store);

        let updated = source.enrich(&track, &record).await.unwrap();
        assert_eq!(updated.audio_features_source, Some(AudioFeaturesSource::Spotify));
        assert_eq!(updated.audio_features().unwrap().energy, 0.73);
    }

    #[tokio::test]
    async fn test_disconnected_records_skipped_without_search() {
        let (store, track, record, _dir) = test_support::blinding_lights().await;
        let (source, api) = source(MockSpotify::disconnected(), store);

        let updated = source.enrich(&track, &record).await.unwrap();
        assert_eq!(updated.spotify_enrichment_status, SpotifyEnrichmentStatus::Skipped);
        assert_eq!(api.search_calls.count(), 0);

        // Second pass has nothing new to record
        assert!(source.enrich(&track, &updated).await.is_none());
    }

    #[tokio::test]
    async fn test_not_found_sets_status() {
        let (store, track, record, _dir) = test_support::blinding_lights().await;
        let (source, _) = source(MockSpotify::not_found(), store);

        let updated = source.enrich(&track, &record).await.unwrap();
        assert_eq!(updated.spotify_enrichment_status, SpotifyEnrichmentStatus::NotFound);
        assert!(updated.album_art_url.is_none());
    }

    #[tokio::test]
    async fn test_error_sets_failed_status_and_reports() {
        let (store, track, record, _dir) = test_support::blinding_lights().await;
        let mock = MockSpotify {
            track: LookupResult::Error {
                message: "HTTP 502".into(),
                retryable: true,
            },
            ..MockSpotify::not_found()
        };
        let (source, _) = source(mock, store);

        let outcome = source.attempt(&track, &record).await;
        assert!(outcome.error().unwrap().contains("HTTP 502"));
        let partial = outcome.updated().unwrap();
        assert_eq!(partial.spotify_enrichment_status, SpotifyEnrichmentStatus::Failed);
    }

    #[tokio::test]
    async fn test_known_track_skips_search_and_keeps_enriched() {
        let (store, track, record, _dir) = test_support::blinding_lights().await;
        let (first_pass, _) = source(MockSpotify::blinding_lights(), store.clone());
        let enriched = first_pass.enrich(&track, &record).await.unwrap();
        assert!(enriched.audio_features_json.is_none());

        // Later pass: search is down, but features now answer by id
        let mock = MockSpotify {
            track: LookupResult::Error {
                message: "HTTP 502".into(),
                retryable: true,
            },
            features: LookupResult::Success((sample_features(0.73), AudioFeaturesSource::Spotify)),
            ..MockSpotify::blinding_lights()
        };
        let (second_pass, api) = source(mock, store.clone());

        let outcome = second_pass.attempt(&track, &enriched).await;
        assert!(outcome.error().is_none());
        let updated = outcome.updated().unwrap();
        assert_eq!(api.search_calls.count(), 0);
        assert_eq!(updated.spotify_enrichment_status, SpotifyEnrichmentStatus::Enriched);
        assert_eq!(updated.audio_features_source, Some(AudioFeaturesSource::Spotify));

        let stored = store.get(track.id).await.unwrap().unwrap();
        assert_eq!(stored.spotify_enrichment_status, SpotifyEnrichmentStatus::Enriched);
    }

    #[tokio::test]
    async fn test_disconnect_does_not_demote_enriched() {
        let (store, track, record, _dir) = test_support::blinding_lights().await;
        let (first_pass, _) = source(MockSpotify::blinding_lights(), store.clone());
        let enriched = first_pass.enrich(&track, &record).await.unwrap();

        let (second_pass, _) = source(MockSpotify::disconnected(), store);
        assert!(second_pass.enrich(&track, &enriched).await.is_none());
    }

    #[tokio::test]
    async fn test_enrich_is_idempotent() {
        let (store, track, record, _dir) = test_support::blinding_lights().await;
        let (source, _) = source(MockSpotify::blinding_lights(), store);

        let first = source.enrich(&track, &record).await.unwrap();
        assert!(source.enrich(&track, &first).await.is_none());
    }
}

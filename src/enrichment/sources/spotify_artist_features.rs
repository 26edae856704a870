use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{Draft, EnrichmentSource, SourceOutcome};
use crate::enrichment::audio_features::{DerivedFeatures, derive_features};
use crate::enrichment::domain::{AudioFeaturesSource, EnrichedMetadata, LookupResult};
use crate::enrichment::gap::EnrichmentGap;
use crate::enrichment::traits::SpotifyApi;
use crate::model::Track;
use crate::store::MetadataStore;

/// Last resort for audio features: average the stored features of the
/// artist's Spotify top tracks.
pub struct SpotifyArtistFeaturesSource {
    api: Arc<dyn SpotifyApi>,
    store: Arc<dyn MetadataStore>,
}

impl SpotifyArtistFeaturesSource {
    pub fn new(api: Arc<dyn SpotifyApi>, store: Arc<dyn MetadataStore>) -> Self {
        Self { api, store }
    }
}

#[async_trait]
impl EnrichmentSource for SpotifyArtistFeaturesSource {
    fn name(&self) -> &'static str {
        "spotify_artist_features"
    }

    fn priority(&self) -> u8 {
        7
    }

    fn can_provide(&self, gap: EnrichmentGap) -> bool {
        self.api.is_connected() && gap.missing_audio_features()
    }

    async fn attempt(&self, track: &Track, current: &EnrichedMetadata) -> SourceOutcome {
        let mut draft = Draft::new(self.name(), current);

        let Some(artist_id) = current.spotify_artist_ids.first() else {
            debug!("No Spotify artist id for track {}", track.id);
            return draft.finish(self.store.as_ref()).await;
        };

        let top_tracks = self.api.artist_top_tracks(artist_id).await;
        let Some(track_ids) = draft.take("top tracks", top_tracks) else {
            return draft.finish(self.store.as_ref()).await;
        };

        let samples = match self.store.find_audio_features_by_spotify_ids(&track_ids).await {
            Ok(found) => found.into_iter().map(|(_, features)| features).collect::<Vec<_>>(),
            Err(e) => {
                warn!("Failed to load stored features for artist {}: {}", artist_id, e);
                return SourceOutcome::Failed {
                    error: format!("{}: {}", self.name(), e),
                    partial: None,
                };
            }
        };

        match derive_features(&samples) {
            DerivedFeatures::Derived {
                features,
                sample_size,
            } => {
                info!(
                    "Derived audio features for track {} from {} of the artist's top tracks",
                    track.id, sample_size
                );
                draft.apply_features(
                    "derived features",
                    LookupResult::Success((
                        features,
                        AudioFeaturesSource::SpotifyArtistDerived,
                    )),
                );
            }
            DerivedFeatures::InsufficientData { available } => {
                debug!(
                    "Only {} of artist {}'s top tracks have features, not deriving",
                    available, artist_id
                );
            }
        }

        draft.finish(self.store.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::sources::test_support;
    use crate::enrichment::traits::mocks::{MockSpotify, sample_features};
    use crate::test_utils::insert_test_track;

    async fn seed_features(store: &crate::store::SqliteStore, energies: &[f64]) -> Vec<String> {
        let mut ids = Vec::new();
        for (i, energy) in energies.iter().enumerate() {
            let spotify_id = format!("top-{}", i);
            let id = insert_test_track(store.pool(), &format!("Top {}", i), "The Weeknd").await;
            store
                .upsert(&EnrichedMetadata {
                    spotify_track_id: Some(spotify_id.clone()),
                    audio_features_json: Some(sample_features(*energy).to_json()),
                    audio_features_source: Some(AudioFeaturesSource::ReccoBeats),
                    ..EnrichedMetadata::new_pending(id)
                })
                .await
                .unwrap();
            ids.push(spotify_id);
        }
        ids
    }

    fn with_top_tracks(ids: Vec<String>) -> MockSpotify {
        MockSpotify {
            top_tracks: LookupResult::Success(ids),
            ..MockSpotify::not_found()
        }
    }

    #[tokio::test]
    async fn test_derives_average_from_overlap() {
        let (store, track, mut record, _dir) = test_support::blinding_lights().await;
        let mut ids = seed_features(&store, &[0.2, 0.4, 0.6]).await;
        ids.push("not-stored".into());
        record.spotify_artist_ids = vec!["1Xyo4u8uXC1ZmMpatF05PJ".into()];

        let source = SpotifyArtistFeaturesSource::new(Arc::new(with_top_tracks(ids)), store);
        let updated = source.enrich(&track, &record).await.unwrap();

        assert_eq!(
            updated.audio_features_source,
            Some(AudioFeaturesSource::SpotifyArtistDerived)
        );
        assert!((updated.audio_features().unwrap().energy - 0.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_insufficient_overlap_leaves_record() {
        let (store, track, mut record, _dir) = test_support::blinding_lights().await;
        let ids = seed_features(&store, &[0.2, 0.4]).await;
        record.spotify_artist_ids = vec!["1Xyo4u8uXC1ZmMpatF05PJ".into()];

        let source = SpotifyArtistFeaturesSource::new(Arc::new(with_top_tracks(ids)), store);
        assert_eq!(source.attempt(&track, &record).await, SourceOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_requires_connection_and_artist_id() {
        let (store, track, record, _dir) = test_support::blinding_lights().await;
        let disconnected =
            SpotifyArtistFeaturesSource::new(Arc::new(MockSpotify::disconnected()), store.clone());
        assert!(!disconnected.can_provide(EnrichmentGap::all()));

        let source = SpotifyArtistFeaturesSource::new(Arc::new(MockSpotify::not_found()), store);
        assert!(source.can_provide(EnrichmentGap::AUDIO_FEATURES));
        // No artist id on the record
        assert_eq!(source.attempt(&track, &record).await, SourceOutcome::Unchanged);
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Draft, EnrichmentSource, SourceOutcome};
use crate::enrichment::domain::EnrichedMetadata;
use crate::enrichment::gap::EnrichmentGap;
use crate::enrichment::traits::ReccoBeatsApi;
use crate::model::Track;
use crate::store::MetadataStore;

/// ReccoBeats: audio features by Spotify id, and optionally by uploading
/// the preview clip for analysis.
pub struct ReccoBeatsSource {
    api: Arc<dyn ReccoBeatsApi>,
    store: Arc<dyn MetadataStore>,
    /// Preview upload is slow and bandwidth heavy, so it is opt-in
    analyze_previews: bool,
}

impl ReccoBeatsSource {
    pub fn new(
        api: Arc<dyn ReccoBeatsApi>,
        store: Arc<dyn MetadataStore>,
        analyze_previews: bool,
    ) -> Self {
        Self {
            api,
            store,
            analyze_previews,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[async_trait]
impl EnrichmentSource for ReccoBeatsSource {
    fn name(&self) -> &'static str {
        "reccobeats"
    }

    fn priority(&self) -> u8 {
        6
    }

    fn can_provide(&self, gap: EnrichmentGap) -> bool {
        gap.missing_audio_features()
    }

    async fn attempt(&self, track: &Track, current: &EnrichedMetadata) -> SourceOutcome {
        let mut draft = Draft::new(self.name(), current);

        let mut found = false;
        if let Some(spotify_id) = present(&current.spotify_track_id) {
            let result = self.api.features_by_spotify_id(spotify_id).await;
            found = draft.apply_features("features lookup", result);
        } else {
            debug!("ReccoBeats: track {} has no Spotify id", track.id);
        }

        if !found
            && self.analyze_previews
            && let Some(preview) = present(&current.preview_url)
        {
            let result = self.api.analyze_preview(preview).await;
            draft.apply_features("preview analysis", result);
        }

        draft.finish(self.store.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::domain::{AudioFeaturesSource, LookupResult};
    use crate::enrichment::sources::test_support;
    use crate::enrichment::traits::mocks::{MockReccoBeats, sample_features};

    fn analysed() -> MockReccoBeats {
        MockReccoBeats {
            analysis: LookupResult::Success((
                sample_features(0.9),
                AudioFeaturesSource::ReccoBeatsAnalysis,
            )),
            ..MockReccoBeats::not_found()
        }
    }

    #[tokio::test]
    async fn test_lookup_by_spotify_id() {
        let (store, track, mut record, _dir) = test_support::blinding_lights().await;
        record.spotify_track_id = Some("0VjIjW4GlUZAMYd2vXMi3b".into());
        let api = Arc::new(MockReccoBeats::with_features(0.73));
        let source = ReccoBeatsSource::new(api, store, false);

        let updated = source.enrich(&track, &record).await.unwrap();
        assert_eq!(updated.audio_features_source, Some(AudioFeaturesSource::ReccoBeats));
        assert_eq!(updated.audio_features().unwrap().energy, 0.73);
    }

    #[tokio::test]
    async fn test_without_spotify_id_makes_no_calls() {
        let (store, track, mut record, _dir) = test_support::blinding_lights().await;
        record.preview_url = Some("https://p.scdn.co/mp3-preview/x".into());
        let api = Arc::new(analysed());
        let source = ReccoBeatsSource::new(api.clone(), store, false);

        assert!(source.enrich(&track, &record).await.is_none());
        assert_eq!(api.id_calls.count(), 0);
        assert_eq!(api.analysis_calls.count(), 0);
    }

    #[tokio::test]
    async fn test_preview_analysis_behind_flag() {
        let (store, track, mut record, _dir) = test_support::blinding_lights().await;
        record.spotify_track_id = Some("unknown-to-reccobeats".into());
        record.preview_url = Some("https://p.scdn.co/mp3-preview/x".into());
        let api = Arc::new(analysed());
        let source = ReccoBeatsSource::new(api.clone(), store, true);

        let updated = source.enrich(&track, &record).await.unwrap();
        assert_eq!(
            updated.audio_features_source,
            Some(AudioFeaturesSource::ReccoBeatsAnalysis)
        );
        assert_eq!(api.id_calls.count(), 1);
        assert_eq!(api.analysis_calls.count(), 1);
    }
}

use std::sync::Arc;

use async_trait::async_trait;

use super::{Draft, EnrichmentSource, SourceOutcome};
use crate::enrichment::domain::{EnrichedMetadata, TrackQuery};
use crate::enrichment::gap::EnrichmentGap;
use crate::enrichment::traits::DeezerApi;
use crate::model::Track;
use crate::store::MetadataStore;

/// Deezer: album art, preview and artist picture. Free, no key.
pub struct DeezerSource {
    api: Arc<dyn DeezerApi>,
    store: Arc<dyn MetadataStore>,
}

impl DeezerSource {
    pub fn new(api: Arc<dyn DeezerApi>, store: Arc<dyn MetadataStore>) -> Self {
        Self { api, store }
    }
}

#[async_trait]
impl EnrichmentSource for DeezerSource {
    fn name(&self) -> &'static str {
        "deezer"
    }

    fn priority(&self) -> u8 {
        5
    }

    fn can_provide(&self, gap: EnrichmentGap) -> bool {
        gap.intersects(
            EnrichmentGap::ALBUM_ART | EnrichmentGap::PREVIEW_URL | EnrichmentGap::ARTIST_IMAGE,
        )
    }

    async fn attempt(&self, track: &Track, current: &EnrichedMetadata) -> SourceOutcome {
        let mut draft = Draft::new(self.name(), current);
        let query = TrackQuery::from(track);

        // The track hit carries the artist picture too
        if draft.gap().intersects(EnrichmentGap::ALBUM_ART | EnrichmentGap::PREVIEW_URL) {
            let result = self.api.search_track(&query).await;
            draft.apply("track search", result);
        }
        if draft.gap().missing_artist_image() {
            let image = self.api.find_artist_image(&query.primary_artist()).await;
            draft.apply_artist_image("artist image", image);
        }

        draft.finish(self.store.as_ref()).await
    }
}

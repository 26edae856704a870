use std::sync::Arc;

use async_trait::async_trait;

use super::{Draft, EnrichmentSource, SourceOutcome};
use crate::enrichment::domain::{EnrichedMetadata, TrackQuery};
use crate::enrichment::gap::EnrichmentGap;
use crate::enrichment::traits::ITunesApi;
use crate::model::Track;
use crate::store::MetadataStore;

/// iTunes Search: album art, preview, Apple Music URL and artist image
/// (API first, then the public artist page).
pub struct ITunesSource {
    api: Arc<dyn ITunesApi>,
    store: Arc<dyn MetadataStore>,
}

impl ITunesSource {
    pub fn new(api: Arc<dyn ITunesApi>, store: Arc<dyn MetadataStore>) -> Self {
        Self { api, store }
    }
}

#[async_trait]
impl EnrichmentSource for ITunesSource {
    fn name(&self) -> &'static str {
        "itunes"
    }

    fn priority(&self) -> u8 {
        4
    }

    fn can_provide(&self, gap: EnrichmentGap) -> bool {
        gap.intersects(
            EnrichmentGap::ALBUM_ART | EnrichmentGap::PREVIEW_URL | EnrichmentGap::ARTIST_IMAGE,
        )
    }

    async fn attempt(&self, track: &Track, current: &EnrichedMetadata) -> SourceOutcome {
        let mut draft = Draft::new(self.name(), current);
        let query = TrackQuery::from(track);
        let gap = draft.gap();

        if gap.missing_album_art() || gap.missing_preview_url() {
            let result = self.api.search_track(&query).await;
            draft.apply("track search", result);
        }
        if gap.missing_artist_image() {
            let image = self.api.find_artist_image(&query.primary_artist()).await;
            draft.apply_artist_image("artist image", image);
        }

        draft.finish(self.store.as_ref()).await
    }
}

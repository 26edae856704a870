use std::sync::Arc;

use async_trait::async_trait;

use super::{Draft, EnrichmentSource, SourceOutcome};
use crate::enrichment::domain::{EnrichedMetadata, TrackQuery};
use crate::enrichment::gap::EnrichmentGap;
use crate::enrichment::traits::MusicBrainzApi;
use crate::model::Track;
use crate::store::MetadataStore;

/// MusicBrainz: genres, tags, MBIDs, release data and label. Needs no credentials.
pub struct MusicBrainzSource {
    api: Arc<dyn MusicBrainzApi>,
    store: Arc<dyn MetadataStore>,
}

impl MusicBrainzSource {
    pub fn new(api: Arc<dyn MusicBrainzApi>, store: Arc<dyn MetadataStore>) -> Self {
        Self { api, store }
    }
}

#[async_trait]
impl EnrichmentSource for MusicBrainzSource {
    fn name(&self) -> &'static str {
        "musicbrainz"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn can_provide(&self, gap: EnrichmentGap) -> bool {
        gap.missing_genres()
    }

    async fn attempt(&self, track: &Track, current: &EnrichedMetadata) -> SourceOutcome {
        let mut draft = Draft::new(self.name(), current);
        let result = self.api.enrich_track(&TrackQuery::from(track)).await;
        draft.apply("recording lookup", result);
        draft.finish(self.store.as_ref()).await
    }
}

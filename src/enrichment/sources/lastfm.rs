use std::sync::Arc;

use async_trait::async_trait;

use super::{Draft, EnrichmentSource, SourceOutcome};
use crate::enrichment::domain::{EnrichedMetadata, TrackQuery};
use crate::enrichment::gap::EnrichmentGap;
use crate::enrichment::traits::LastFmApi;
use crate::model::Track;
use crate::store::MetadataStore;

/// Last.fm: supplemental tags, track URL and an artist image fallback.
/// Unavailable without an API key.
pub struct LastFmSource {
    api: Arc<dyn LastFmApi>,
    store: Arc<dyn MetadataStore>,
}

impl LastFmSource {
    pub fn new(api: Arc<dyn LastFmApi>, store: Arc<dyn MetadataStore>) -> Self {
        Self { api, store }
    }
}

#[async_trait]
impl EnrichmentSource for LastFmSource {
    fn name(&self) -> &'static str {
        "lastfm"
    }

    fn priority(&self) -> u8 {
        3
    }

    fn can_provide(&self, gap: EnrichmentGap) -> bool {
        self.api.is_configured() && (gap.missing_genres() || gap.missing_artist_image())
    }

    async fn attempt(&self, track: &Track, current: &EnrichedMetadata) -> SourceOutcome {
        let mut draft = Draft::new(self.name(), current);
        let query = TrackQuery::from(track);
        let gap = draft.gap();

        if gap.missing_genres() {
            let tags = self.api.track_tags(&query).await;
            draft.apply("track tags", tags);
        }
        if gap.missing_artist_image() {
            let image = self.api.artist_image(&query.primary_artist()).await;
            draft.apply_artist_image("artist image", image);
        }

        draft.finish(self.store.as_ref()).await
    }
}

//! Enrichment strategies, one per provider.
//!
//! Every source follows the same contract: query its provider, merge the
//! result into the current record with fill-gaps-only rules, persist, and
//! return the updated record. Sources never return errors; a provider
//! failure is reported as [`SourceOutcome::Failed`] and the orchestrator
//! moves on.

mod deezer;
mod itunes;
mod lastfm;
mod musicbrainz;
mod reccobeats;
mod spotify;
mod spotify_artist_features;

pub use deezer::DeezerSource;
pub use itunes::ITunesSource;
pub use lastfm::LastFmSource;
pub use musicbrainz::MusicBrainzSource;
pub use reccobeats::ReccoBeatsSource;
pub use spotify::SpotifySource;
pub use spotify_artist_features::SpotifyArtistFeaturesSource;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use super::domain::{ArtistImage, EnrichedMetadata, LookupResult};
use super::gap::EnrichmentGap;
use super::merge::{MetadataPatch, apply_patch};
use super::traits::FeaturesLookup;
use crate::model::Track;
use crate::store::MetadataStore;

/// What one source did to a record
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    /// New data was merged and persisted
    Updated(EnrichedMetadata),
    /// Nothing new (no match, not configured, or nothing to add)
    Unchanged,
    /// A provider or store failure. `partial` holds whatever was still
    /// merged and persisted.
    Failed {
        error: String,
        partial: Option<EnrichedMetadata>,
    },
}

impl SourceOutcome {
    /// The record to continue with, if this outcome produced one.
    pub fn updated(self) -> Option<EnrichedMetadata> {
        match self {
            SourceOutcome::Updated(record) => Some(record),
            SourceOutcome::Failed { partial, .. } => partial,
            SourceOutcome::Unchanged => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SourceOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// A provider-backed strategy for filling metadata gaps.
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower runs first.
    fn priority(&self) -> u8;

    /// Whether this source is available and could fill part of `gap`.
    fn can_provide(&self, gap: EnrichmentGap) -> bool;

    /// Run the source against `current` and report what happened.
    async fn attempt(&self, track: &Track, current: &EnrichedMetadata) -> SourceOutcome;

    /// The updated record, or `None` when nothing changed.
    async fn enrich(&self, track: &Track, current: &EnrichedMetadata) -> Option<EnrichedMetadata> {
        self.attempt(track, current).await.updated()
    }
}

/// Accumulates provider results for one source run, then persists once.
pub(crate) struct Draft<'a> {
    source: &'static str,
    original: &'a EnrichedMetadata,
    working: EnrichedMetadata,
    error: Option<String>,
}

impl<'a> Draft<'a> {
    pub fn new(source: &'static str, current: &'a EnrichedMetadata) -> Self {
        Self {
            source,
            original: current,
            working: current.clone(),
            error: None,
        }
    }

    /// The record with everything applied so far.
    pub fn current(&self) -> &EnrichedMetadata {
        &self.working
    }

    pub fn gap(&self) -> EnrichmentGap {
        super::gap::compute_gap(Some(&self.working))
    }

    pub fn patch(&mut self, patch: &MetadataPatch) {
        self.working = apply_patch(&self.working, patch);
    }

    /// Apply a successful lookup; log anything else. Returns whether it succeeded.
    pub fn apply(&mut self, what: &str, result: LookupResult<MetadataPatch>) -> bool {
        match self.take(what, result) {
            Some(patch) => {
                self.patch(&patch);
                true
            }
            None => false,
        }
    }

    pub fn apply_artist_image(&mut self, what: &str, result: LookupResult<ArtistImage>) -> bool {
        match self.take(what, result) {
            Some(image) => {
                self.patch(&MetadataPatch::default().with_artist_image(image.source, image.url));
                true
            }
            None => false,
        }
    }

    pub fn apply_features(&mut self, what: &str, result: FeaturesLookup) -> bool {
        match self.take(what, result) {
            Some(features) => {
                self.patch(&MetadataPatch {
                    audio_features: Some(features),
                    ..Default::default()
                });
                true
            }
            None => false,
        }
    }

    /// Unwrap a lookup, logging misses and remembering failures.
    pub fn take<T>(&mut self, what: &str, result: LookupResult<T>) -> Option<T> {
        match result {
            LookupResult::Success(value) => Some(value),
            LookupResult::Error { message, retryable } => {
                warn!(
                    "{} {} failed (retryable: {}): {}",
                    self.source, what, retryable, message
                );
                self.error = Some(format!("{} {}: {}", self.source, what, message));
                None
            }
            other => {
                debug!("{} {}: {}", self.source, what, other.label());
                None
            }
        }
    }

    /// Persist the merged record if anything changed.
    pub async fn finish(self, store: &dyn MetadataStore) -> SourceOutcome {
        let Draft {
            source,
            original,
            mut working,
            error,
        } = self;

        if working == *original {
            return match error {
                Some(error) => SourceOutcome::Failed {
                    error,
                    partial: None,
                },
                None => SourceOutcome::Unchanged,
            };
        }

        working.cache_timestamp = Some(Utc::now());
        if let Err(e) = store.upsert(&working).await {
            warn!("{}: failed to store record {}: {}", source, working.track_id, e);
            return SourceOutcome::Failed {
                error: format!("{}: store failed: {}", source, e),
                partial: None,
            };
        }

        debug!("{} updated record {}", source, working.track_id);
        match error {
            Some(error) => SourceOutcome::Failed {
                error,
                partial: Some(working),
            },
            None => SourceOutcome::Updated(working),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::domain::AlbumArtSource;
    use crate::enrichment::traits::mocks::album_art;

    #[tokio::test]
    async fn test_draft_unchanged_without_data() {
        let (store, _track, record, _dir) = test_support::blinding_lights().await;
        let mut draft = Draft::new("test", &record);
        assert!(!draft.apply("search", LookupResult::NotFound));
        assert_eq!(draft.finish(store.as_ref()).await, SourceOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_draft_persists_changes() {
        let (store, _track, record, _dir) = test_support::blinding_lights().await;
        let mut draft = Draft::new("test", &record);
        draft.apply(
            "search",
            LookupResult::Success(MetadataPatch {
                album_art: Some(album_art("https://x/a.jpg", AlbumArtSource::Deezer)),
                ..Default::default()
            }),
        );
        let updated = draft.finish(store.as_ref()).await.updated().unwrap();
        assert!(updated.cache_timestamp.is_some());

        let stored = store.get(record.track_id).await.unwrap().unwrap();
        assert_eq!(stored.album_art_source, AlbumArtSource::Deezer);
    }

    #[tokio::test]
    async fn test_draft_error_keeps_partial() {
        let (store, _track, record, _dir) = test_support::blinding_lights().await;
        let mut draft = Draft::new("test", &record);
        draft.apply(
            "tags",
            LookupResult::Success(MetadataPatch {
                lastfm_tags: vec!["pop".into()],
                ..Default::default()
            }),
        );
        draft.apply_artist_image(
            "image",
            LookupResult::Error {
                message: "HTTP 500".into(),
                retryable: true,
            },
        );
        let outcome = draft.finish(store.as_ref()).await;
        assert_eq!(outcome.error(), Some("test image: HTTP 500"));
        assert_eq!(outcome.updated().unwrap().lastfm_tags, vec!["pop".to_string()]);
    }

    #[tokio::test]
    async fn test_draft_error_without_changes() {
        let (store, _track, record, _dir) = test_support::blinding_lights().await;
        let mut draft = Draft::new("test", &record);
        draft.apply(
            "search",
            LookupResult::Error {
                message: "timeout".into(),
                retryable: true,
            },
        );
        let outcome = draft.finish(store.as_ref()).await;
        assert!(matches!(outcome, SourceOutcome::Failed { partial: None, .. }));
    }
}

//! Enrichment service - orchestrates the sources for each track
//!
//! One pass over a track:
//! 1. Load (or create) its PENDING record
//! 2. Compute the gap and run the highest-priority source that can fill it
//! 3. Re-evaluate the gap; repeat until it closes or no untried source applies
//! 4. Resolve the credited artists (fills the artist cache and artist image)
//! 5. Record status, retry count and last error
//!
//! Sources run strictly one at a time. A failing source only shows up as
//! "no improvement" and the pass moves on.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::artist_images::{ArtistImageResolver, ArtistProviders, ArtistResolution};
use super::deezer::DeezerClient;
use super::domain::{EnrichedMetadata, EnrichmentStatus};
use super::gap::{EnrichmentGap, compute_gap};
use super::itunes::ITunesClient;
use super::lastfm::LastFmClient;
use super::musicbrainz::MusicBrainzClient;
use super::reccobeats::ReccoBeatsClient;
use super::sources::{
    DeezerSource, EnrichmentSource, ITunesSource, LastFmSource, MusicBrainzSource,
    ReccoBeatsSource, SpotifyArtistFeaturesSource, SpotifySource,
};
use super::spotify::{SpotifyClient, StaticSpotifyAuth};
use crate::config::{
    Config, ConfigLookup, EXTENDED_AUDIO_ANALYSIS, EnrichmentSettings, LASTFM_API_KEY,
    SPOTIFY_ACCESS_TOKEN,
};
use crate::error::{Error, Result};
use crate::model::Track;
use crate::store::{MetadataStore, SqliteStore};

/// What one enrichment pass did to a track
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    pub track_id: i64,
    pub status: EnrichmentStatus,
    /// Sources run, in order
    pub tried: Vec<&'static str>,
    /// Sources that changed the record
    pub updated_by: Vec<&'static str>,
    /// Provider failures seen during the pass
    pub errors: Vec<String>,
    /// Gap left after the pass (empty when complete)
    #[serde(serialize_with = "serialize_gap")]
    pub remaining: EnrichmentGap,
    pub record: EnrichedMetadata,
}

impl EnrichmentReport {
    pub fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }
}

fn serialize_gap<S: serde::Serializer>(gap: &EnrichmentGap, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&gap.describe())
}

/// Totals for a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    /// Gap fully closed
    pub complete: usize,
    /// ENRICHED with gaps remaining
    pub partial: usize,
    pub failed: usize,
    /// Tracks that could not be processed at all (store errors, missing tracks)
    pub errors: usize,
}

impl BatchSummary {
    fn record(&mut self, report: &EnrichmentReport) {
        self.processed += 1;
        match report.status {
            EnrichmentStatus::Failed => self.failed += 1,
            _ if report.is_complete() => self.complete += 1,
            _ => self.partial += 1,
        }
    }
}

/// Service for enriching track metadata from the configured sources
pub struct EnrichmentService {
    store: Arc<dyn MetadataStore>,
    sources: Vec<Arc<dyn EnrichmentSource>>,
    artists: Option<ArtistImageResolver>,
    settings: EnrichmentSettings,
}

impl EnrichmentService {
    /// Create a service over `sources`; they are run in priority order.
    pub fn new(store: Arc<dyn MetadataStore>, mut sources: Vec<Arc<dyn EnrichmentSource>>) -> Self {
        sources.sort_by_key(|s| s.priority());
        Self {
            store,
            sources,
            artists: None,
            settings: EnrichmentSettings::default(),
        }
    }

    pub fn with_artist_resolver(mut self, resolver: ArtistImageResolver) -> Self {
        self.artists = Some(resolver);
        self
    }

    pub fn with_settings(mut self, settings: EnrichmentSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build every provider client and source from configuration.
    ///
    /// Missing credentials never fail here; the affected sources simply
    /// report themselves unavailable.
    pub fn from_config(config: &Config, store: Arc<SqliteStore>) -> Result<Self> {
        let timeout = config.enrichment.http_timeout();
        let auth = Arc::new(StaticSpotifyAuth::new(config.get(SPOTIFY_ACCESS_TOKEN)));

        let spotify = Arc::new(SpotifyClient::new(auth, timeout)?);
        let musicbrainz = Arc::new(MusicBrainzClient::new(timeout)?);
        let lastfm = Arc::new(LastFmClient::new(config.get(LASTFM_API_KEY), timeout)?);
        let itunes = Arc::new(ITunesClient::new(timeout)?);
        let deezer = Arc::new(DeezerClient::new(timeout)?);
        let reccobeats = Arc::new(ReccoBeatsClient::new(timeout)?);

        let records: Arc<dyn MetadataStore> = store.clone();
        let sources: Vec<Arc<dyn EnrichmentSource>> = vec![
            Arc::new(SpotifySource::new(spotify.clone(), records.clone())),
            Arc::new(MusicBrainzSource::new(musicbrainz.clone(), records.clone())),
            Arc::new(LastFmSource::new(lastfm.clone(), records.clone())),
            Arc::new(ITunesSource::new(itunes.clone(), records.clone())),
            Arc::new(DeezerSource::new(deezer.clone(), records.clone())),
            Arc::new(ReccoBeatsSource::new(
                reccobeats,
                records.clone(),
                config.flag(EXTENDED_AUDIO_ANALYSIS),
            )),
            Arc::new(SpotifyArtistFeaturesSource::new(spotify.clone(), records.clone())),
        ];

        let resolver = ArtistImageResolver::new(
            ArtistProviders {
                spotify,
                deezer,
                itunes,
                lastfm,
                musicbrainz,
            },
            store,
            records.clone(),
        )
        .with_delay(config.enrichment.artist_delay());

        Ok(Self::new(records, sources)
            .with_artist_resolver(resolver)
            .with_settings(config.enrichment.clone()))
    }

    /// Source names in the order they run
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Run one enrichment pass over `track`.
    pub async fn enrich_track(&self, track: &Track) -> Result<EnrichmentReport> {
        let mut current = self.store.ensure_pending(track.id).await?;
        let mut gap = compute_gap(Some(&current));
        let mut tried: HashSet<&'static str> = HashSet::new();
        let mut report_tried = Vec::new();
        let mut updated_by = Vec::new();
        let mut errors = Vec::new();

        debug!("Track {} starts with gap: {}", track.id, gap);

        while !gap.is_empty() {
            let Some(source) = self
                .sources
                .iter()
                .find(|s| !tried.contains(s.name()) && s.can_provide(gap))
            else {
                break;
            };
            tried.insert(source.name());
            report_tried.push(source.name());

            let outcome = source.attempt(track, &current).await;
            if let Some(error) = outcome.error() {
                errors.push(error.to_string());
            }
            if let Some(updated) = outcome.updated() {
                debug!("{} updated track {}", source.name(), track.id);
                updated_by.push(source.name());
                current = updated;
            }
            gap = compute_gap(Some(&current));
        }

        if let Some(resolver) = &self.artists {
            match resolver.resolve_track(track).await {
                Ok(ArtistResolution {
                    record_updated: true,
                    ..
                }) => {
                    if let Some(record) = self.store.get(track.id).await? {
                        current = record;
                        gap = compute_gap(Some(&current));
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Artist resolution failed for track {}: {}", track.id, e),
            }
        }

        let (status, retry_count) = if gap.is_empty() {
            (EnrichmentStatus::Enriched, current.retry_count)
        } else if current.has_any_data() {
            (EnrichmentStatus::Enriched, current.retry_count + 1)
        } else {
            (EnrichmentStatus::Failed, current.retry_count + 1)
        };
        let last_error = errors.last().cloned();
        self.store
            .record_attempt(track.id, status, retry_count, last_error.as_deref())
            .await?;

        current.enrichment_status = status;
        current.retry_count = retry_count;
        current.last_error = last_error;
        current.last_enrichment_attempt = Some(Utc::now());

        if gap.is_empty() {
            info!("Track {} '{}' fully enriched", track.id, track.title);
        } else {
            info!(
                "Track {} '{}' {} (still missing: {})",
                track.id,
                track.title,
                status.as_str(),
                gap
            );
        }

        Ok(EnrichmentReport {
            track_id: track.id,
            status,
            tried: report_tried,
            updated_by,
            errors,
            remaining: gap,
            record: current,
        })
    }

    /// Enrich a track by id.
    pub async fn enrich_track_id(&self, track_id: i64) -> Result<EnrichmentReport> {
        let track = self
            .store
            .get_track(track_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("track {}", track_id)))?;
        self.enrich_track(&track).await
    }

    /// Enrich up to `limit` PENDING records.
    pub async fn enrich_pending(&self, limit: usize) -> Result<BatchSummary> {
        let records = self.store.query_pending(limit).await?;
        info!("Enriching {} pending tracks", records.len());
        Ok(self.run_batch(&records, false).await)
    }

    /// Retry FAILED records whose back-off has elapsed.
    pub async fn retry_failed(&self, limit: usize) -> Result<BatchSummary> {
        let records = self
            .store
            .query_failed_for_retry(
                self.settings.max_retries,
                self.settings.retry_after(),
                limit,
            )
            .await?;
        info!("Retrying {} failed tracks", records.len());
        Ok(self.run_batch(&records, false).await)
    }

    /// Re-run ENRICHED records whose cache timestamp is older than the
    /// configured staleness window.
    pub async fn refresh_stale(&self, limit: usize) -> Result<BatchSummary> {
        let threshold = Utc::now() - self.settings.stale_after();
        let records = self.store.query_stale(threshold, limit).await?;
        info!("Refreshing {} stale tracks", records.len());
        Ok(self.run_batch(&records, true).await)
    }

    /// Resolve artists for the given tracks without running the sources.
    pub async fn resolve_artists(&self, track_ids: &[i64]) -> Result<BatchSummary> {
        let resolver = self
            .artists
            .as_ref()
            .ok_or_else(|| Error::config("artist resolution is not configured"))?;

        let mut summary = BatchSummary::default();
        for &track_id in track_ids {
            let track = match self.store.get_track(track_id).await {
                Ok(Some(track)) => track,
                Ok(None) => {
                    warn!("Track {} not found, skipping", track_id);
                    summary.errors += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Failed to load track {}: {}", track_id, e);
                    summary.errors += 1;
                    continue;
                }
            };
            match resolver.resolve_track(&track).await {
                Ok(resolution) => {
                    summary.processed += 1;
                    if resolution.failed > 0 {
                        summary.failed += 1;
                    } else {
                        summary.complete += 1;
                    }
                }
                Err(e) => {
                    warn!("Artist resolution failed for track {}: {}", track_id, e);
                    summary.errors += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn run_batch(&self, records: &[EnrichedMetadata], touch_cache: bool) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let total = records.len();

        for (i, record) in records.iter().enumerate() {
            match self.run_one(record.track_id, touch_cache).await {
                Ok(report) => summary.record(&report),
                Err(e) => {
                    warn!("Enrichment failed for track {}: {}", record.track_id, e);
                    summary.errors += 1;
                }
            }

            if (i + 1) % 10 == 0 {
                info!("Enriched {}/{} tracks", i + 1, total);
            }
        }

        summary
    }

    async fn run_one(&self, track_id: i64, touch_cache: bool) -> Result<EnrichmentReport> {
        let mut report = self.enrich_track_id(track_id).await?;
        // A refresh that found nothing new still counts as fresh
        if touch_cache && report.updated_by.is_empty() {
            report.record.cache_timestamp = Some(Utc::now());
            self.store.upsert(&report.record).await?;
        }
        Ok(report)
    }
}

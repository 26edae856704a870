//! Persistence for enrichment records and the artist cache.
//!
//! [`MetadataStore`] and [`ArtistStore`] are the seams the enrichment code
//! depends on; [`SqliteStore`] implements both over the `enriched_metadata`
//! and `artists` tables.
//!
//! List fields are stored as JSON arrays and timestamps as RFC 3339 text
//! (always UTC with a `Z` suffix, so string order is time order).

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::enrichment::domain::{
    AlbumArtSource, ArtistImageSource, AudioFeatures, AudioFeaturesSource, EnrichedMetadata,
    EnrichmentStatus, SpotifyEnrichmentStatus,
};
use crate::error::Result;
use crate::model::{Artist, Track};

/// Storage for per-track enrichment records.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// The observed track a record belongs to.
    async fn get_track(&self, track_id: i64) -> Result<Option<Track>>;

    async fn get(&self, track_id: i64) -> Result<Option<EnrichedMetadata>>;

    /// Insert or replace the whole record. Returns the track id.
    async fn upsert(&self, record: &EnrichedMetadata) -> Result<i64>;

    /// PENDING records, oldest track first.
    async fn query_pending(&self, limit: usize) -> Result<Vec<EnrichedMetadata>>;

    /// ENRICHED records whose cache timestamp is older than `threshold`.
    async fn query_stale(&self, threshold: DateTime<Utc>, limit: usize) -> Result<Vec<EnrichedMetadata>>;

    /// FAILED records with retries left whose last attempt is at least
    /// `retry_after` old.
    async fn query_failed_for_retry(
        &self,
        max_retries: i64,
        retry_after: Duration,
        limit: usize,
    ) -> Result<Vec<EnrichedMetadata>>;

    async fn mark_status(&self, track_id: i64, status: EnrichmentStatus) -> Result<()>;

    /// The existing record, or a freshly inserted PENDING one.
    async fn ensure_pending(&self, track_id: i64) -> Result<EnrichedMetadata>;

    /// Bookkeeping after an enrichment pass; stamps `last_enrichment_attempt`.
    async fn record_attempt(
        &self,
        track_id: i64,
        status: EnrichmentStatus,
        retry_count: i64,
        error: Option<&str>,
    ) -> Result<()>;

    /// Stored (non-derived) audio features for the given Spotify track ids.
    async fn find_audio_features_by_spotify_ids(
        &self,
        spotify_ids: &[String],
    ) -> Result<Vec<(String, AudioFeatures)>>;
}

/// Artist cache keyed by normalized name.
#[async_trait]
pub trait ArtistStore: Send + Sync {
    async fn get_artist(&self, normalized_name: &str) -> Result<Option<Artist>>;

    async fn upsert_artist(&self, artist: &Artist) -> Result<()>;
}

/// SQLite implementation of both stores.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ============================================================================
// Row mapping
// ============================================================================

const COLUMNS: &[&str] = &[
    "track_id",
    "musicbrainz_recording_id",
    "musicbrainz_artist_id",
    "musicbrainz_release_id",
    "musicbrainz_release_group_id",
    "album_title",
    "release_date",
    "release_year",
    "musicbrainz_tags",
    "musicbrainz_genres",
    "record_label",
    "spotify_track_id",
    "spotify_artist_ids",
    "spotify_track_url",
    "spotify_verified_artist_name",
    "spotify_artist_image_url",
    "itunes_artist_image_url",
    "apple_music_url",
    "deezer_artist_image_url",
    "lastfm_tags",
    "lastfm_artist_image_url",
    "lastfm_url",
    "audio_features_json",
    "audio_features_source",
    "album_art_url",
    "album_art_small_url",
    "album_art_large_url",
    "album_art_source",
    "preview_url",
    "enrichment_status",
    "spotify_enrichment_status",
    "retry_count",
    "last_enrichment_attempt",
    "cache_timestamp",
    "last_error",
];

static SELECT_SQL: LazyLock<String> =
    LazyLock::new(|| format!("SELECT {} FROM enriched_metadata", COLUMNS.join(", ")));

fn select_sql() -> &'static str {
    &SELECT_SQL
}

static UPSERT_SQL: LazyLock<String> = LazyLock::new(|| {
    let placeholders = vec!["?"; COLUMNS.len()].join(", ");
    let updates = COLUMNS[1..]
        .iter()
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(",\n    ");
    format!(
        "INSERT INTO enriched_metadata ({})\nVALUES ({})\nON CONFLICT(track_id) DO UPDATE SET\n    {}",
        COLUMNS.join(", "),
        placeholders,
        updates
    )
});

fn upsert_sql() -> &'static str {
    &UPSERT_SQL
}

#[derive(Debug, FromRow)]
struct MetadataRow {
    track_id: i64,
    musicbrainz_recording_id: Option<String>,
    musicbrainz_artist_id: Option<String>,
    musicbrainz_release_id: Option<String>,
    musicbrainz_release_group_id: Option<String>,
    album_title: Option<String>,
    release_date: Option<String>,
    release_year: Option<i32>,
    musicbrainz_tags: String,
    musicbrainz_genres: String,
    record_label: Option<String>,
    spotify_track_id: Option<String>,
    spotify_artist_ids: String,
    spotify_track_url: Option<String>,
    spotify_verified_artist_name: Option<String>,
    spotify_artist_image_url: Option<String>,
    itunes_artist_image_url: Option<String>,
    apple_music_url: Option<String>,
    deezer_artist_image_url: Option<String>,
    lastfm_tags: String,
    lastfm_artist_image_url: Option<String>,
    lastfm_url: Option<String>,
    audio_features_json: Option<String>,
    audio_features_source: Option<String>,
    album_art_url: Option<String>,
    album_art_small_url: Option<String>,
    album_art_large_url: Option<String>,
    album_art_source: String,
    preview_url: Option<String>,
    enrichment_status: String,
    spotify_enrichment_status: String,
    retry_count: i64,
    last_enrichment_attempt: Option<String>,
    cache_timestamp: Option<String>,
    last_error: Option<String>,
}

fn json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!("Malformed list column {:?}: {}", raw, e);
        Vec::new()
    })
}

fn list_json(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn timestamp_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
}

impl From<MetadataRow> for EnrichedMetadata {
    fn from(row: MetadataRow) -> Self {
        Self {
            track_id: row.track_id,
            musicbrainz_recording_id: row.musicbrainz_recording_id,
            musicbrainz_artist_id: row.musicbrainz_artist_id,
            musicbrainz_release_id: row.musicbrainz_release_id,
            musicbrainz_release_group_id: row.musicbrainz_release_group_id,
            album_title: row.album_title,
            release_date: row.release_date,
            release_year: row.release_year,
            musicbrainz_tags: json_list(&row.musicbrainz_tags),
            musicbrainz_genres: json_list(&row.musicbrainz_genres),
            record_label: row.record_label,
            spotify_track_id: row.spotify_track_id,
            spotify_artist_ids: json_list(&row.spotify_artist_ids),
            spotify_track_url: row.spotify_track_url,
            spotify_verified_artist_name: row.spotify_verified_artist_name,
            spotify_artist_image_url: row.spotify_artist_image_url,
            itunes_artist_image_url: row.itunes_artist_image_url,
            apple_music_url: row.apple_music_url,
            deezer_artist_image_url: row.deezer_artist_image_url,
            lastfm_tags: json_list(&row.lastfm_tags),
            lastfm_artist_image_url: row.lastfm_artist_image_url,
            lastfm_url: row.lastfm_url,
            audio_features_json: row.audio_features_json,
            audio_features_source: row
                .audio_features_source
                .as_deref()
                .and_then(AudioFeaturesSource::parse),
            album_art_url: row.album_art_url,
            album_art_small_url: row.album_art_small_url,
            album_art_large_url: row.album_art_large_url,
            album_art_source: row.album_art_source.parse().unwrap_or_default(),
            preview_url: row.preview_url,
            enrichment_status: row.enrichment_status.parse().unwrap_or_default(),
            spotify_enrichment_status: row.spotify_enrichment_status.parse().unwrap_or_default(),
            retry_count: row.retry_count,
            last_enrichment_attempt: row.last_enrichment_attempt.as_deref().and_then(parse_timestamp),
            cache_timestamp: row.cache_timestamp.as_deref().and_then(parse_timestamp),
            last_error: row.last_error,
        }
    }
}

#[derive(Debug, FromRow)]
struct ArtistRow {
    normalized_name: String,
    display_name: String,
    image_url: Option<String>,
    image_source: Option<String>,
    spotify_id: Option<String>,
    musicbrainz_id: Option<String>,
    genres: String,
    country: Option<String>,
    updated_at: Option<String>,
}

impl From<ArtistRow> for Artist {
    fn from(row: ArtistRow) -> Self {
        Self {
            normalized_name: row.normalized_name,
            display_name: row.display_name,
            image_url: row.image_url,
            image_source: row.image_source.as_deref().and_then(ArtistImageSource::parse),
            spotify_id: row.spotify_id,
            musicbrainz_id: row.musicbrainz_id,
            genres: json_list(&row.genres),
            country: row.country,
            updated_at: row.updated_at.as_deref().and_then(parse_timestamp),
        }
    }
}

fn rows_to_records(rows: Vec<MetadataRow>) -> Vec<EnrichedMetadata> {
    rows.into_iter().map(EnrichedMetadata::from).collect()
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn get_track(&self, track_id: i64) -> Result<Option<Track>> {
        Ok(crate::db::get_track(&self.pool, track_id).await?)
    }

    async fn get(&self, track_id: i64) -> Result<Option<EnrichedMetadata>> {
        let sql = format!("{} WHERE track_id = ?", select_sql());
        let row = sqlx::query_as::<_, MetadataRow>(&sql)
            .bind(track_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(EnrichedMetadata::from))
    }

    async fn upsert(&self, record: &EnrichedMetadata) -> Result<i64> {
        sqlx::query(upsert_sql())
            .bind(record.track_id)
            .bind(&record.musicbrainz_recording_id)
            .bind(&record.musicbrainz_artist_id)
            .bind(&record.musicbrainz_release_id)
            .bind(&record.musicbrainz_release_group_id)
            .bind(&record.album_title)
            .bind(&record.release_date)
            .bind(record.release_year)
            .bind(list_json(&record.musicbrainz_tags))
            .bind(list_json(&record.musicbrainz_genres))
            .bind(&record.record_label)
            .bind(&record.spotify_track_id)
            .bind(list_json(&record.spotify_artist_ids))
            .bind(&record.spotify_track_url)
            .bind(&record.spotify_verified_artist_name)
            .bind(&record.spotify_artist_image_url)
            .bind(&record.itunes_artist_image_url)
            .bind(&record.apple_music_url)
            .bind(&record.deezer_artist_image_url)
            .bind(list_json(&record.lastfm_tags))
            .bind(&record.lastfm_artist_image_url)
            .bind(&record.lastfm_url)
            .bind(&record.audio_features_json)
            .bind(record.audio_features_source.map(|s| s.as_str()))
            .bind(&record.album_art_url)
            .bind(&record.album_art_small_url)
            .bind(&record.album_art_large_url)
            .bind(record.album_art_source.as_str())
            .bind(&record.preview_url)
            .bind(record.enrichment_status.as_str())
            .bind(record.spotify_enrichment_status.as_str())
            .bind(record.retry_count)
            .bind(record.last_enrichment_attempt.as_ref().map(timestamp_text))
            .bind(record.cache_timestamp.as_ref().map(timestamp_text))
            .bind(&record.last_error)
            .execute(&self.pool)
            .await?;
        Ok(record.track_id)
    }

    async fn query_pending(&self, limit: usize) -> Result<Vec<EnrichedMetadata>> {
        let sql = format!(
            "{} WHERE enrichment_status = 'PENDING' ORDER BY track_id LIMIT ?",
            select_sql()
        );
        let rows = sqlx::query_as::<_, MetadataRow>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows_to_records(rows))
    }

    async fn query_stale(&self, threshold: DateTime<Utc>, limit: usize) -> Result<Vec<EnrichedMetadata>> {
        let threshold = timestamp_text(&threshold);
        let sql = format!(
            "{} WHERE enrichment_status = 'ENRICHED' \
             AND (cache_timestamp IS NULL OR cache_timestamp < ?) \
             ORDER BY cache_timestamp, track_id LIMIT ?",
            select_sql()
        );
        let rows = sqlx::query_as::<_, MetadataRow>(&sql)
            .bind(threshold)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows_to_records(rows))
    }

    async fn query_failed_for_retry(
        &self,
        max_retries: i64,
        retry_after: Duration,
        limit: usize,
    ) -> Result<Vec<EnrichedMetadata>> {
        let retry_after = chrono::Duration::from_std(retry_after).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(retry_after)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let cutoff = timestamp_text(&cutoff);
        let sql = format!(
            "{} WHERE enrichment_status = 'FAILED' AND retry_count < ? \
             AND (last_enrichment_attempt IS NULL OR last_enrichment_attempt <= ?) \
             ORDER BY last_enrichment_attempt, track_id LIMIT ?",
            select_sql()
        );
        let rows = sqlx::query_as::<_, MetadataRow>(&sql)
            .bind(max_retries)
            .bind(cutoff)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows_to_records(rows))
    }

    async fn mark_status(&self, track_id: i64, status: EnrichmentStatus) -> Result<()> {
        sqlx::query("UPDATE enriched_metadata SET enrichment_status = ? WHERE track_id = ?")
            .bind(status.as_str())
            .bind(track_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ensure_pending(&self, track_id: i64) -> Result<EnrichedMetadata> {
        sqlx::query("INSERT OR IGNORE INTO enriched_metadata (track_id) VALUES (?)")
            .bind(track_id)
            .execute(&self.pool)
            .await?;
        Ok(self
            .get(track_id)
            .await?
            .unwrap_or_else(|| EnrichedMetadata::new_pending(track_id)))
    }

    async fn record_attempt(
        &self,
        track_id: i64,
        status: EnrichmentStatus,
        retry_count: i64,
        error: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE enriched_metadata
            SET enrichment_status = ?, retry_count = ?, last_enrichment_attempt = ?, last_error = ?
            WHERE track_id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(retry_count)
        .bind(timestamp_text(&Utc::now()))
        .bind(error)
        .bind(track_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_audio_features_by_spotify_ids(
        &self,
        spotify_ids: &[String],
    ) -> Result<Vec<(String, AudioFeatures)>> {
        if spotify_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT spotify_track_id, audio_features_json FROM enriched_metadata \
             WHERE audio_features_json IS NOT NULL \
             AND (audio_features_source IS NULL OR audio_features_source != ",
        );
        builder.push_bind(AudioFeaturesSource::SpotifyArtistDerived.as_str());
        builder.push(") AND spotify_track_id IN (");
        let mut ids = builder.separated(", ");
        for id in spotify_ids {
            ids.push_bind(id.as_str());
        }
        builder.push(")");

        let rows: Vec<(String, String)> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .filter_map(|(id, json)| AudioFeatures::from_json(&json).map(|f| (id, f)))
            .collect())
    }
}

#[async_trait]
impl ArtistStore for SqliteStore {
    async fn get_artist(&self, normalized_name: &str) -> Result<Option<Artist>> {
        let row = sqlx::query_as::<_, ArtistRow>(
            r#"
            SELECT normalized_name, display_name, image_url, image_source, spotify_id,
                   musicbrainz_id, genres, country, updated_at
            FROM artists WHERE normalized_name = ?
            "#,
        )
        .bind(normalized_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Artist::from))
    }

    async fn upsert_artist(&self, artist: &Artist) -> Result<()> {
        let updated_at = artist.updated_at.unwrap_or_else(Utc::now);
        sqlx::query(
            r#"
            INSERT INTO artists (normalized_name, display_name, image_url, image_source,
                                 spotify_id, musicbrainz_id, genres, country, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(normalized_name) DO UPDATE SET
                display_name = excluded.display_name,
                image_url = excluded.image_url,
                image_source = excluded.image_source,
                spotify_id = excluded.spotify_id,
                musicbrainz_id = excluded.musicbrainz_id,
                genres = excluded.genres,
                country = excluded.country,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&artist.normalized_name)
        .bind(&artist.display_name)
        .bind(&artist.image_url)
        .bind(artist.image_source.map(|s| s.as_str()))
        .bind(&artist.spotify_id)
        .bind(&artist.musicbrainz_id)
        .bind(list_json(&artist.genres))
        .bind(&artist.country)
        .bind(timestamp_text(&updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_test_track, temp_db};

    #[tokio::test]
    async fn test_ensure_pending_creates_once() {
        let (pool, _dir) = temp_db().await;
        let store = SqliteStore::new(pool.clone());
        let track_id = insert_test_track(&pool, "Blinding Lights", "The Weeknd").await;

        let first = store.ensure_pending(track_id).await.unwrap();
        assert_eq!(first.enrichment_status, EnrichmentStatus::Pending);

        let mut changed = first.clone();
        changed.musicbrainz_genres = vec!["synth-pop".into()];
        store.upsert(&changed).await.unwrap();

        let again = store.ensure_pending(track_id).await.unwrap();
        assert_eq!(again.musicbrainz_genres, vec!["synth-pop".to_string()]);
    }

    #[tokio::test]
    async fn test_upsert_round_trips_every_kind_of_column() {
        let (pool, _dir) = temp_db().await;
        let store = SqliteStore::new(pool.clone());
        let track_id = insert_test_track(&pool, "Blinding Lights", "The Weeknd").await;

        let now = Utc::now();
        let record = EnrichedMetadata {
            track_id,
            release_year: Some(2020),
            lastfm_tags: vec!["synthpop".into(), "80s".into()],
            spotify_artist_ids: vec!["1Xyo4u8uXC1ZmMpatF05PJ".into()],
            audio_features_json: Some(AudioFeatures::default().to_json()),
            audio_features_source: Some(AudioFeaturesSource::ReccoBeats),
            album_art_url: Some("https://i.scdn.co/image/x".into()),
            album_art_source: AlbumArtSource::Spotify,
            enrichment_status: EnrichmentStatus::Enriched,
            spotify_enrichment_status: SpotifyEnrichmentStatus::Enriched,
            retry_count: 2,
            cache_timestamp: Some(now),
            ..EnrichedMetadata::new_pending(track_id)
        };
        store.upsert(&record).await.unwrap();

        let loaded = store.get(track_id).await.unwrap().unwrap();
        assert_eq!(loaded.lastfm_tags, record.lastfm_tags);
        assert_eq!(loaded.album_art_source, AlbumArtSource::Spotify);
        assert_eq!(loaded.audio_features_source, Some(AudioFeaturesSource::ReccoBeats));
        assert_eq!(loaded.spotify_enrichment_status, SpotifyEnrichmentStatus::Enriched);
        assert_eq!(loaded.retry_count, 2);
        assert_eq!(
            loaded.cache_timestamp.map(|t| t.timestamp_millis()),
            Some(now.timestamp_millis())
        );
    }

    #[tokio::test]
    async fn test_query_pending_and_mark_status() {
        let (pool, _dir) = temp_db().await;
        let store = SqliteStore::new(pool.clone());
        let a = insert_test_track(&pool, "A", "Artist").await;
        let b = insert_test_track(&pool, "B", "Artist").await;
        store.ensure_pending(a).await.unwrap();
        store.ensure_pending(b).await.unwrap();

        store.mark_status(a, EnrichmentStatus::Enriched).await.unwrap();
        let pending = store.query_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].track_id, b);
    }

    #[tokio::test]
    async fn test_query_stale() {
        let (pool, _dir) = temp_db().await;
        let store = SqliteStore::new(pool.clone());
        let old = insert_test_track(&pool, "Old", "Artist").await;
        let fresh = insert_test_track(&pool, "Fresh", "Artist").await;
        let now = Utc::now();

        for (id, age_days) in [(old, 40), (fresh, 1)] {
            store
                .upsert(&EnrichedMetadata {
                    enrichment_status: EnrichmentStatus::Enriched,
                    cache_timestamp: Some(now - chrono::Duration::days(age_days)),
                    ..EnrichedMetadata::new_pending(id)
                })
                .await
                .unwrap();
        }

        let stale = store
            .query_stale(now - chrono::Duration::days(30), 10)
            .await
            .unwrap();
        assert_eq!(stale.iter().map(|r| r.track_id).collect::<Vec<_>>(), vec![old]);
    }

    #[tokio::test]
    async fn test_query_failed_for_retry_respects_limits() {
        let (pool, _dir) = temp_db().await;
        let store = SqliteStore::new(pool.clone());
        let retryable = insert_test_track(&pool, "Retry", "Artist").await;
        let exhausted = insert_test_track(&pool, "Exhausted", "Artist").await;
        store.ensure_pending(retryable).await.unwrap();
        store.ensure_pending(exhausted).await.unwrap();

        store
            .record_attempt(retryable, EnrichmentStatus::Failed, 1, Some("timeout"))
            .await
            .unwrap();
        store
            .record_attempt(exhausted, EnrichmentStatus::Failed, 5, None)
            .await
            .unwrap();

        // Just attempted: not due yet
        let due = store
            .query_failed_for_retry(5, Duration::from_secs(3600), 10)
            .await
            .unwrap();
        assert!(due.is_empty());

        let due = store
            .query_failed_for_retry(5, Duration::ZERO, 10)
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].track_id, retryable);
        assert_eq!(due[0].last_error.as_deref(), Some("timeout"));
        assert!(due[0].last_enrichment_attempt.is_some());
    }

    #[tokio::test]
    async fn test_find_audio_features_skips_derived() {
        let (pool, _dir) = temp_db().await;
        let store = SqliteStore::new(pool.clone());
        let features = AudioFeatures {
            energy: 0.8,
            ..Default::default()
        };

        for (title, spotify_id, source) in [
            ("Real", "sp-real", AudioFeaturesSource::ReccoBeats),
            ("Derived", "sp-derived", AudioFeaturesSource::SpotifyArtistDerived),
        ] {
            let id = insert_test_track(&pool, title, "Artist").await;
            store
                .upsert(&EnrichedMetadata {
                    spotify_track_id: Some(spotify_id.into()),
                    audio_features_json: Some(features.to_json()),
                    audio_features_source: Some(source),
                    ..EnrichedMetadata::new_pending(id)
                })
                .await
                .unwrap();
        }

        let ids = vec!["sp-real".to_string(), "sp-derived".into(), "sp-unknown".into()];
        let found = store.find_audio_features_by_spotify_ids(&ids).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "sp-real");
        assert_eq!(found[0].1.energy, 0.8);
        assert!(store.find_audio_features_by_spotify_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_artist_cache_upsert() {
        let (pool, _dir) = temp_db().await;
        let store = SqliteStore::new(pool);

        let mut artist = Artist::new("The Weeknd");
        store.upsert_artist(&artist).await.unwrap();
        let cached = store.get_artist("the weeknd").await.unwrap().unwrap();
        assert!(!cached.has_image());

        artist.image_url = Some("https://img/weeknd.jpg".into());
        artist.image_source = Some(ArtistImageSource::Deezer);
        artist.genres = vec!["r&b".into()];
        store.upsert_artist(&artist).await.unwrap();

        let cached = store.get_artist("the weeknd").await.unwrap().unwrap();
        assert!(cached.has_image());
        assert_eq!(cached.image_source, Some(ArtistImageSource::Deezer));
        assert_eq!(cached.genres, vec!["r&b".to_string()]);
        assert!(cached.updated_at.is_some());
        assert!(store.get_artist("nobody").await.unwrap().is_none());
    }
}

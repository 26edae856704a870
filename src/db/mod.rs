//! Database module for track persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Provides async operations for:
//! - Connection setup and migrations
//! - Track insert, lookup, listing and removal
//!
//! Enrichment records and the artist cache are accessed through
//! [`crate::store::SqliteStore`].
//!
//! # Example
//!
//! ```ignore
//! use listen_tracker::db::{init_db, insert_track, NewTrack};
//!
//! let pool = init_db("sqlite:listen_tracker.db").await?;
//! let id = insert_track(&pool, &NewTrack::new("Blinding Lights", "The Weeknd")).await?;
//! ```

use serde::Serialize;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::model::Track;

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "listen_tracker.db";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
///
/// # Arguments
///
/// * `path` - Optional path to the database file
///
/// # Returns
///
/// A SQLite connection URL string (e.g., "sqlite:listen_tracker.db")
pub fn db_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
///
/// # Arguments
///
/// * `db_url` - SQLite connection URL (e.g., "sqlite:listen_tracker.db")
///
/// # Errors
///
/// Returns an error if:
/// - Database creation fails
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// A track as observed by the listener, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_ms: Option<i64>,
}

impl NewTrack {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration_ms: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }
}

/// Record a track and create its PENDING enrichment record.
///
/// A track with the same title, artist and album (NULL albums compare
/// equal here) returns the existing id. Calling this repeatedly never
/// resets an existing enrichment record.
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `track` - Track identity as observed
///
/// # Returns
///
/// The database ID of the (existing or new) track.
pub async fn insert_track(pool: &SqlitePool, track: &NewTrack) -> sqlx::Result<i64> {
    let album = track.album.as_deref().filter(|a| !a.trim().is_empty());
    let mut tx = pool.begin().await?;

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM tracks WHERE title = ? AND artist = ? AND album IS ?")
            .bind(&track.title)
            .bind(&track.artist)
            .bind(album)
            .fetch_optional(&mut *tx)
            .await?;

    let id = match existing {
        Some((id,)) => id,
        None => {
            sqlx::query(
                "INSERT INTO tracks (title, artist, album, duration_ms) VALUES (?, ?, ?, ?)",
            )
            .bind(&track.title)
            .bind(&track.artist)
            .bind(album)
            .bind(track.duration_ms)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid()
        }
    };

    sqlx::query("INSERT OR IGNORE INTO enriched_metadata (track_id) VALUES (?)")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(id)
}

/// Get a track by its database ID.
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `track_id` - ID of the track to retrieve
///
/// # Returns
///
/// The track if found, or None.
pub async fn get_track(pool: &SqlitePool, track_id: i64) -> sqlx::Result<Option<Track>> {
    sqlx::query_as::<_, Track>(
        "SELECT id, title, artist, album, duration_ms FROM tracks WHERE id = ?",
    )
    .bind(track_id)
    .fetch_optional(pool)
    .await
}

/// Track with its enrichment state, for listings.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TrackSummary {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// PENDING / ENRICHED / FAILED (PENDING when the record is missing)
    pub enrichment_status: String,
    pub album_art_source: String,
    pub retry_count: i64,
}

/// All tracks with their enrichment status, in insertion order.
///
/// Performs a LEFT JOIN so tracks without a record still show up.
pub async fn list_tracks(pool: &SqlitePool) -> sqlx::Result<Vec<TrackSummary>> {
    sqlx::query_as::<_, TrackSummary>(
        r#"
        SELECT
            t.id, t.title, t.artist, t.album,
            COALESCE(m.enrichment_status, 'PENDING') AS enrichment_status,
            COALESCE(m.album_art_source, 'NONE') AS album_art_source,
            COALESCE(m.retry_count, 0) AS retry_count
        FROM tracks t
        LEFT JOIN enriched_metadata m ON m.track_id = t.id
        ORDER BY t.id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Remove a track. Its enrichment record goes with it.
///
/// # Returns
///
/// Whether a track was deleted.
pub async fn delete_track(pool: &SqlitePool, track_id: i64) -> sqlx::Result<bool> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM enriched_metadata WHERE track_id = ?")
        .bind(track_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
        .bind(track_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

//! Test utilities and fixtures for listen-tracker tests.
//!
//! This module provides common test helpers and database utilities to
//! reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use listen_tracker::test_utils::{temp_db, insert_test_track};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     let id = insert_test_track(&pool, "Blinding Lights", "The Weeknd").await;
//!     // ... test logic
//! }
//! ```

use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::db::NewTrack;

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// # Returns
///
/// A tuple of (connection pool, temp directory handle).
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Inserts a track (and its PENDING record) and returns its ID.
pub async fn insert_test_track(pool: &SqlitePool, title: &str, artist: &str) -> i64 {
    crate::db::insert_track(pool, &NewTrack::new(title, artist))
        .await
        .expect("Failed to insert track")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;

        // Should be able to query
        let tracks = crate::db::list_tracks(&pool).await.unwrap();
        assert!(tracks.is_empty());
    }

    #[tokio::test]
    async fn test_insert_test_track() {
        let (pool, _dir) = temp_db().await;

        let id = insert_test_track(&pool, "Song", "Artist").await;
        assert!(id > 0);

        let track = crate::db::get_track(&pool, id).await.unwrap().unwrap();
        assert_eq!(track.artist, "Artist");
    }
}

//! Application-wide error types.
//!
//! This module provides a unified error hierarchy for the application.
//! Library modules use specific error types via `thiserror`, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum
//! - Module-specific errors (e.g., [`EnrichmentError`](crate::enrichment::EnrichmentError))
//!   for detailed handling
//! - Provider failures never surface here; clients turn them into
//!   [`LookupResult`](crate::enrichment::LookupResult) values instead
//!
//! # Example
//!
//! ```ignore
//! use listen_tracker::error::{Result, ResultExt};
//!
//! async fn load(store: &SqliteStore, id: i64) -> Result<()> {
//!     let record = store.get(id).await.with_context("loading record")?;
//!     Ok(())
//! }
//! ```

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
///
/// Aggregates errors from all subsystems for unified handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Provider client construction or lookup error
    #[error("Enrichment error: {0}")]
    Enrichment(#[from] crate::enrichment::EnrichmentError),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A track or record that should exist does not
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::EnrichmentError;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("track 42");
        assert!(err.to_string().contains("track 42"));
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::config("bad toml").context("while loading settings");
        let msg = err.to_string();
        assert!(msg.contains("while loading settings"));
        assert!(msg.contains("bad toml"));
    }

    #[test]
    fn test_enrichment_error_converts() {
        let err: Error = EnrichmentError::Network("connection reset".into()).into();
        assert!(matches!(err, Error::Enrichment(_)));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(Error::not_found("record"));
        let with_ctx = result.with_context("additional context");
        assert!(with_ctx.unwrap_err().to_string().contains("additional context"));
    }

    #[test]
    fn test_sqlx_result_ext() {
        let result: std::result::Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = result.with_context("fetching track").unwrap_err();
        assert!(err.to_string().starts_with("fetching track"));
    }
}

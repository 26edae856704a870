//! Metadata enrichment - fills a track's record from external providers.
//!
//! # Architecture
//!
//! This module follows a clean separation between:
//! - **Domain models** (`domain.rs`) - the record, lookup results and source ranks
//! - **API DTOs** (`<provider>/dto.rs`) - exact API response shapes
//! - **Adapters** - convert DTOs to patches and domain types
//! - **Clients** - rate-limited, circuit-broken HTTP clients per provider
//! - **Sources** (`sources/`) - one strategy per provider behind [`sources::EnrichmentSource`]
//! - **Service** - the gap-driven orchestration loop
//!
//! The gap analyzer decides what is missing, the service picks the
//! highest-priority source that can fill it, and merge rules guarantee that
//! sources only ever fill blanks (album art may also be upgraded to a
//! higher-ranked source).
//!
//! # Usage
//!
//! ```ignore
//! let config = config::load();
//! let store = Arc::new(SqliteStore::new(pool));
//! let service = EnrichmentService::from_config(&config, store)?;
//!
//! let report = service.enrich_track_id(42).await?;
//! println!("{:?}, still missing: {}", report.status, report.remaining);
//! ```

pub mod artist_images;
pub mod artists;
pub mod audio_features;
pub mod domain;
pub mod gap;
pub mod http;
pub mod matching;
pub mod merge;
pub mod resilience;
pub mod service;
pub mod sources;
pub mod traits;

pub mod deezer;
pub mod itunes;
pub mod lastfm;
pub mod musicbrainz;
pub mod reccobeats;
pub mod spotify;

pub use domain::{EnrichedMetadata, EnrichmentError, EnrichmentStatus, LookupResult};
pub use gap::{EnrichmentGap, compute_gap};
pub use service::{BatchSummary, EnrichmentReport, EnrichmentService};

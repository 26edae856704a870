//! MusicBrainz API integration
//!
//! The genre source: searches for the recording, looks it up with genres,
//! tags and release groups, and fills MBIDs, album, release date and label.
//!
//! API docs: https://musicbrainz.org/doc/MusicBrainz_API

pub mod dto;
mod adapter;
mod client;

pub use client::{MIN_INTERVAL, MusicBrainzArtist, MusicBrainzClient, search_strategies};

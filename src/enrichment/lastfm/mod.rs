//! Last.fm API integration
//!
//! Community tags as a genre fallback, the track's Last.fm page, and
//! artist photos as the last artist-image fallback. Needs an API key.
//!
//! API docs: https://www.last.fm/api

pub mod dto;
mod adapter;
mod client;

pub use adapter::PLACEHOLDER_IMAGE_HASH;
pub use client::{LastFmClient, MIN_INTERVAL};

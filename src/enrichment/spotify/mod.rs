//! Spotify Web API integration
//!
//! Highest-ranked source: album art, preview clips, track/artist ids,
//! artist images and (while the endpoint still answers) audio features.
//! Requires a connected user account.
//!
//! API docs: https://developer.spotify.com/documentation/web-api

pub mod dto;
mod adapter;
mod auth;
mod client;

pub use auth::{SpotifyAuth, StaticSpotifyAuth};
pub use client::{MIN_INTERVAL, SpotifyClient, search_strategies};

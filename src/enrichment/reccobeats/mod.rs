//! ReccoBeats API integration
//!
//! Audio features keyed by Spotify track id, plus clip analysis for tracks
//! it has never seen.

pub mod dto;
mod adapter;
mod client;

pub use client::{MIN_INTERVAL, ReccoBeatsClient};

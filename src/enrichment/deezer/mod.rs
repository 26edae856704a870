//! Deezer API integration
//!
//! Album covers, 30 second previews and artist pictures. No credentials.
//!
//! API docs: https://developers.deezer.com/api

pub mod dto;
mod adapter;
mod client;

pub use client::{DeezerClient, MIN_INTERVAL, search_strategies};

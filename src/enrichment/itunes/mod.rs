//! iTunes Search API integration
//!
//! Album art (resized to 600px), preview clips, Apple Music links and
//! scraped artist pictures. No credentials needed.
//!
//! API docs: https://performance-partners.apple.com/search-api

pub mod dto;
mod adapter;
mod client;
mod scrape;

pub use client::{ITunesClient, MIN_INTERVAL, search_strategies};

//! Listen Tracker - a personal listening log with metadata enrichment.
//!
//! Tracks are recorded as they are played and enriched from Spotify,
//! MusicBrainz, Last.fm, iTunes, Deezer and ReccoBeats: album art, genres,
//! audio features, artist images and previews.

pub mod cli;
pub mod config;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod model;
pub mod store;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("listen_tracker=info".parse()?))
        .init();

    cli::run_command(&args)
}

//! CLI command definitions and dispatch.
//!
//! Each group of subcommands is implemented in its own submodule:
//! - `tracks`: adding, listing, showing and removing tracks
//! - `enrich`: enrichment passes, batches, artist resolution and config checks

mod enrich;
mod tracks;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::db;
use crate::enrichment::EnrichmentService;
use crate::store::SqliteStore;

pub use enrich::{
    cmd_check_config, cmd_enrich, cmd_enrich_track, cmd_refresh_stale, cmd_resolve_artists,
    cmd_retry_failed,
};
pub use tracks::{cmd_add_track, cmd_list, cmd_remove_track, cmd_show};

/// Listen Tracker CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database path (default: listen_tracker.db in the current directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Last.fm API key (overrides the config file)
    #[arg(long, global = true, env = "LASTFM_API_KEY", hide_env_values = true)]
    pub lastfm_api_key: Option<String>,

    /// Spotify access token (overrides the config file)
    #[arg(long, global = true, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    pub spotify_token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Record a listened track (creates a PENDING enrichment record)
    AddTrack {
        /// Track title
        title: String,
        /// Artist credit as shown by the player, e.g. "A & B"
        artist: String,
        /// Album name
        #[arg(long)]
        album: Option<String>,
        /// Duration in milliseconds
        #[arg(long)]
        duration_ms: Option<i64>,
        /// Enrich the track right away
        #[arg(long)]
        enrich: bool,
    },
    /// List all tracks with their enrichment status
    List {
        /// Only show tracks with this status (pending, enriched, failed)
        #[arg(long)]
        status: Option<String>,
    },
    /// Show a track's enrichment record
    Show {
        /// Track ID
        id: i64,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Enrich pending tracks
    Enrich {
        /// Maximum number of tracks (default: config batch_size)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Run one enrichment pass over a single track
    EnrichTrack {
        /// Track ID
        id: i64,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Retry failed tracks whose back-off has elapsed
    RetryFailed {
        /// Maximum number of tracks (default: config batch_size)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Re-run enriched tracks whose cached data is stale
    RefreshStale {
        /// Maximum number of tracks (default: config batch_size)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Resolve artist images for one track or every track
    ResolveArtists {
        /// Only this track
        #[arg(long)]
        track: Option<i64>,
    },
    /// Remove a track and its enrichment record
    RemoveTrack {
        /// Track ID
        id: i64,
    },
    /// Show which providers are available with the current configuration
    CheckConfig {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;

    match &cli.command {
        Commands::AddTrack {
            title,
            artist,
            album,
            duration_ms,
            enrich,
        } => cmd_add_track(
            &rt,
            cli,
            title,
            artist,
            album.as_deref(),
            *duration_ms,
            *enrich,
        ),
        Commands::List { status } => cmd_list(&rt, cli, status.as_deref()),
        Commands::Show { id, json } => cmd_show(&rt, cli, *id, *json),
        Commands::Enrich { limit } => cmd_enrich(&rt, cli, *limit),
        Commands::EnrichTrack { id, json } => cmd_enrich_track(&rt, cli, *id, *json),
        Commands::RetryFailed { limit } => cmd_retry_failed(&rt, cli, *limit),
        Commands::RefreshStale { limit } => cmd_refresh_stale(&rt, cli, *limit),
        Commands::ResolveArtists { track } => cmd_resolve_artists(&rt, cli, *track),
        Commands::RemoveTrack { id } => cmd_remove_track(&rt, cli, *id),
        Commands::CheckConfig { init } => cmd_check_config(cli, *init),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Config file values with command-line / environment overrides applied
pub(crate) fn load_config(cli: &Cli) -> Config {
    let mut config = config::load();
    if let Some(key) = cli.lastfm_api_key.clone() {
        config.credentials.lastfm_api_key = Some(key);
    }
    if let Some(token) = cli.spotify_token.clone() {
        config.credentials.spotify_access_token = Some(token);
    }
    config
}

/// Open (and migrate) the database selected by `--db`
pub(crate) async fn open_store(cli: &Cli) -> anyhow::Result<Arc<SqliteStore>> {
    let url = db::db_url(cli.db.as_deref());
    let pool = db::init_db(&url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database {}: {}", url, e))?;
    Ok(Arc::new(SqliteStore::new(pool)))
}

/// Store plus a fully wired enrichment service
pub(crate) async fn open_service(
    cli: &Cli,
) -> anyhow::Result<(Arc<SqliteStore>, EnrichmentService, Config)> {
    let config = load_config(cli);
    let store = open_store(cli).await?;
    let service = EnrichmentService::from_config(&config, store.clone())?;
    Ok((store, service, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "listen-tracker",
            "--db",
            "x.db",
            "add-track",
            "Blinding Lights",
            "The Weeknd",
            "--album",
            "After Hours",
        ])
        .unwrap();
        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("x.db")));
        assert!(matches!(
            cli.command,
            Commands::AddTrack { ref album, enrich: false, .. } if album.as_deref() == Some("After Hours")
        ));

        let cli = Cli::try_parse_from(["listen-tracker", "enrich", "-l", "10"]).unwrap();
        assert!(matches!(cli.command, Commands::Enrich { limit: Some(10) }));
    }

    #[test]
    fn test_global_db_after_subcommand() {
        let cli = Cli::try_parse_from(["listen-tracker", "show", "3", "--json", "--db", "y.db"])
            .unwrap();
        assert!(cli.db.is_some());
        assert!(matches!(cli.command, Commands::Show { id: 3, json: true }));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "listen-tracker",
            "--lastfm-api-key",
            "abc",
            "check-config",
        ])
        .unwrap();
        let config = load_config(&cli);
        assert_eq!(config.credentials.lastfm_api_key.as_deref(), Some("abc"));
    }
}

//! Enrichment commands.

use tokio::runtime::Runtime;

use crate::config::{self, ConfigLookup, EXTENDED_AUDIO_ANALYSIS, LASTFM_API_KEY, SPOTIFY_ACCESS_TOKEN};
use crate::db;
use crate::enrichment::BatchSummary;

use super::{Cli, load_config, open_service};

fn print_summary(what: &str, summary: &BatchSummary) {
    println!();
    println!("{} {} tracks", what, summary.processed);
    println!("  ✓ Complete: {}", summary.complete);
    println!("  ~ Partial:  {}", summary.partial);
    println!("  ✗ Failed:   {}", summary.failed);
    if summary.errors > 0 {
        println!("  ! Errors:   {}", summary.errors);
    }
}

/// Enrich pending tracks
pub fn cmd_enrich(rt: &Runtime, cli: &Cli, limit: Option<usize>) -> anyhow::Result<()> {
    rt.block_on(async {
        let (_, service, config) = open_service(cli).await?;
        let limit = limit.unwrap_or(config.enrichment.batch_size);
        let summary = service.enrich_pending(limit).await?;
        print_summary("Enriched", &summary);
        Ok(())
    })
}

/// Run one enrichment pass over a single track
pub fn cmd_enrich_track(rt: &Runtime, cli: &Cli, id: i64, json: bool) -> anyhow::Result<()> {
    rt.block_on(async {
        let (_, service, _) = open_service(cli).await?;
        let report = service.enrich_track_id(id).await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("Track {}: {}", id, report.status.as_str());
        println!("  Tried:   {}", report.tried.join(" → "));
        if !report.updated_by.is_empty() {
            println!("  Updated: {}", report.updated_by.join(", "));
        }
        if report.is_complete() {
            println!("  ✓ Nothing missing");
        } else {
            println!("  Missing: {}", report.remaining);
        }
        for error in &report.errors {
            println!("  ✗ {}", error);
        }
        Ok(())
    })
}

/// Retry failed tracks whose back-off has elapsed
pub fn cmd_retry_failed(rt: &Runtime, cli: &Cli, limit: Option<usize>) -> anyhow::Result<()> {
    rt.block_on(async {
        let (_, service, config) = open_service(cli).await?;
        let limit = limit.unwrap_or(config.enrichment.batch_size);
        let summary = service.retry_failed(limit).await?;
        print_summary("Retried", &summary);
        Ok(())
    })
}

/// Re-run enriched tracks with stale data
pub fn cmd_refresh_stale(rt: &Runtime, cli: &Cli, limit: Option<usize>) -> anyhow::Result<()> {
    rt.block_on(async {
        let (_, service, config) = open_service(cli).await?;
        let limit = limit.unwrap_or(config.enrichment.batch_size);
        let summary = service.refresh_stale(limit).await?;
        print_summary("Refreshed", &summary);
        Ok(())
    })
}

/// Resolve artist images for one track or every track
pub fn cmd_resolve_artists(rt: &Runtime, cli: &Cli, track: Option<i64>) -> anyhow::Result<()> {
    rt.block_on(async {
        let (store, service, _) = open_service(cli).await?;
        let ids = match track {
            Some(id) => vec![id],
            None => db::list_tracks(store.pool())
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect(),
        };
        println!("Resolving artists for {} tracks...", ids.len());
        let summary = service.resolve_artists(&ids).await?;
        print_summary("Resolved artists for", &summary);
        Ok(())
    })
}

/// Show which providers are usable with the current configuration
pub fn cmd_check_config(cli: &Cli, init: bool) -> anyhow::Result<()> {
    let config = load_config(cli);

    match config::config_path() {
        Some(path) if path.exists() => println!("Config file: {}", path.display()),
        Some(path) if init => {
            config::save(&config::Config::default())?;
            println!("✓ Wrote default config to {}", path.display());
        }
        Some(path) => println!("Config file: {} (not found, using defaults)", path.display()),
        None => println!("Config file: no config directory on this platform"),
    }
    println!();

    println!("Providers:");
    println!("✓ MusicBrainz, iTunes, Deezer: always available");
    if config.get(SPOTIFY_ACCESS_TOKEN).is_some() {
        println!("✓ Spotify: connected");
    } else {
        println!("✗ Spotify: not connected (set SPOTIFY_ACCESS_TOKEN or credentials.spotify_access_token)");
    }
    if config.get(LASTFM_API_KEY).is_some() {
        println!("✓ Last.fm: API key set");
    } else {
        println!("✗ Last.fm: no API key (set LASTFM_API_KEY or credentials.lastfm_api_key)");
        println!("  Get one at: https://www.last.fm/api/account/create");
    }
    if config.flag(EXTENDED_AUDIO_ANALYSIS) {
        println!("✓ ReccoBeats: lookup + preview analysis");
    } else {
        println!("✓ ReccoBeats: lookup only (features.extended_audio_analysis is off)");
    }

    let settings = &config.enrichment;
    println!();
    println!("Enrichment:");
    println!("  batch_size:        {}", settings.batch_size);
    println!("  max_retries:       {}", settings.max_retries);
    println!("  retry_after_secs:  {}", settings.retry_after_secs);
    println!("  stale_after_days:  {}", settings.stale_after_days);
    println!("  artist_delay_ms:   {}", settings.artist_delay_ms);
    println!("  http_timeout_secs: {}", settings.http_timeout_secs);

    Ok(())
}

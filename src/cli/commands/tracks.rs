//! Track management commands.

use serde::Serialize;
use tokio::runtime::Runtime;

use crate::db::{self, NewTrack};
use crate::enrichment::artists::{artist_key, parse_artists};
use crate::enrichment::{EnrichedMetadata, EnrichmentService, compute_gap};
use crate::model::{Artist, Track};
use crate::store::{ArtistStore, MetadataStore};

use super::{Cli, load_config, open_store};

/// Record a track, optionally enriching it immediately
pub fn cmd_add_track(
    rt: &Runtime,
    cli: &Cli,
    title: &str,
    artist: &str,
    album: Option<&str>,
    duration_ms: Option<i64>,
    enrich: bool,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let store = open_store(cli).await?;

        let mut track = NewTrack::new(title, artist);
        if let Some(album) = album {
            track = track.with_album(album);
        }
        track.duration_ms = duration_ms;

        let id = db::insert_track(store.pool(), &track).await?;
        println!("✓ Track {}: {} - {}", id, artist, title);

        if enrich {
            let config = load_config(cli);
            let service = EnrichmentService::from_config(&config, store.clone())?;
            let report = service.enrich_track_id(id).await?;
            println!(
                "  {} via [{}]",
                report.status.as_str(),
                report.updated_by.join(", ")
            );
            if !report.is_complete() {
                println!("  Still missing: {}", report.remaining);
            }
        }
        Ok(())
    })
}

/// List all tracks with their enrichment status
pub fn cmd_list(rt: &Runtime, cli: &Cli, status: Option<&str>) -> anyhow::Result<()> {
    rt.block_on(async {
        let store = open_store(cli).await?;
        let wanted = status.map(str::to_uppercase);

        let tracks = db::list_tracks(store.pool()).await?;
        let mut shown = 0;
        for track in tracks
            .iter()
            .filter(|t| wanted.as_deref().is_none_or(|s| t.enrichment_status == s))
        {
            println!(
                "{:>5}  {:<8}  {:<7}  {} - {}{}",
                track.id,
                track.enrichment_status,
                track.album_art_source,
                track.artist,
                track.title,
                track
                    .album
                    .as_deref()
                    .map(|a| format!(" ({})", a))
                    .unwrap_or_default()
            );
            shown += 1;
        }
        println!("\n{} of {} tracks", shown, tracks.len());
        Ok(())
    })
}

#[derive(Serialize)]
struct TrackDetails {
    track: Track,
    record: Option<EnrichedMetadata>,
    missing: String,
    artists: Vec<Artist>,
}

/// Show a track's enrichment record
pub fn cmd_show(rt: &Runtime, cli: &Cli, id: i64, json: bool) -> anyhow::Result<()> {
    rt.block_on(async {
        let store = open_store(cli).await?;
        let Some(track) = store.get_track(id).await? else {
            anyhow::bail!("Track {} not found", id);
        };
        let record = store.get(id).await?;

        let mut artists = Vec::new();
        for name in parse_artists(&track.artist) {
            if let Some(artist) = store.get_artist(&artist_key(&name)).await? {
                artists.push(artist);
            }
        }

        let details = TrackDetails {
            missing: compute_gap(record.as_ref()).describe(),
            track,
            record,
            artists,
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&details)?);
        } else {
            print_details(&details);
        }
        Ok(())
    })
}

fn print_details(details: &TrackDetails) {
    let track = &details.track;
    println!("Track {}: {} - {}", track.id, track.artist, track.title);
    if let Some(album) = &track.album {
        println!("  Album:         {}", album);
    }

    let Some(record) = &details.record else {
        println!("  (no enrichment record)");
        return;
    };

    println!(
        "  Status:        {} (retries: {}, spotify: {})",
        record.enrichment_status.as_str(),
        record.retry_count,
        record.spotify_enrichment_status.as_str()
    );
    println!("  Missing:       {}", details.missing);

    let field = |label: &str, value: Option<&str>| {
        if let Some(value) = value {
            println!("  {:<14} {}", format!("{}:", label), value);
        }
    };
    field("Album art", record.album_art_url.as_deref());
    if record.album_art_url.is_some() {
        field("Art source", Some(record.album_art_source.as_str()));
    }
    field("Preview", record.preview_url.as_deref());
    field("Artist image", record.artist_image_url());
    if !record.genres().is_empty() {
        field("Genres", Some(&record.genres().join(", ")));
    }
    field("Released", record.release_date.as_deref());
    field("Label", record.record_label.as_deref());
    field("Spotify", record.spotify_track_url.as_deref());
    field("Apple Music", record.apple_music_url.as_deref());
    field("Last.fm", record.lastfm_url.as_deref());
    if let Some(features) = record.audio_features() {
        println!(
            "  Features:      energy {:.2}, valence {:.2}, tempo {:.0} ({})",
            features.energy,
            features.valence,
            features.tempo,
            record
                .audio_features_source
                .map(|s| s.as_str())
                .unwrap_or("unknown")
        );
    }
    field("Last error", record.last_error.as_deref());

    for artist in &details.artists {
        println!(
            "  Artist:        {} [{}]",
            artist.display_name,
            artist
                .image_source
                .map(|s| s.as_str())
                .unwrap_or("no image")
        );
    }
}

/// Remove a track and its enrichment record
pub fn cmd_remove_track(rt: &Runtime, cli: &Cli, id: i64) -> anyhow::Result<()> {
    rt.block_on(async {
        let store = open_store(cli).await?;
        if db::delete_track(store.pool(), id).await? {
            println!("✓ Removed track {}", id);
        } else {
            println!("✗ Track {} not found", id);
        }
        Ok(())
    })
}

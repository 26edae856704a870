//! Artist fan-out: resolve an image (and a little metadata) for every
//! artist credited on a track, and cache it by normalized name.
//!
//! Providers are tried in order Spotify (when connected), Deezer, iTunes,
//! Last.fm (when configured). Artists are processed one at a time with a
//! pause between them; a failure for one artist never stops the rest.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::artists::{artist_key, parse_artists};
use super::domain::{ArtistImage, LookupResult};
use super::merge::{MetadataPatch, merge_changed};
use super::traits::{DeezerApi, ITunesApi, LastFmApi, MusicBrainzApi, SpotifyApi};
use crate::error::Result;
use crate::model::{Artist, Track};
use crate::store::{ArtistStore, MetadataStore};

/// Default pause between artists
pub const DEFAULT_ARTIST_DELAY: Duration = Duration::from_millis(250);

/// The provider clients used for artist lookups
#[derive(Clone)]
pub struct ArtistProviders {
    pub spotify: Arc<dyn SpotifyApi>,
    pub deezer: Arc<dyn DeezerApi>,
    pub itunes: Arc<dyn ITunesApi>,
    pub lastfm: Arc<dyn LastFmApi>,
    pub musicbrainz: Arc<dyn MusicBrainzApi>,
}

/// Result of resolving a track's artists
#[derive(Debug, Default)]
pub struct ArtistResolution {
    /// Every artist that was resolved or read from cache, in credit order
    pub artists: Vec<Artist>,
    /// Artists whose resolution failed
    pub failed: usize,
    /// Whether the track's record picked up the primary artist's image
    pub record_updated: bool,
}

pub struct ArtistImageResolver {
    providers: ArtistProviders,
    artists: Arc<dyn ArtistStore>,
    records: Arc<dyn MetadataStore>,
    delay: Duration,
}

impl ArtistImageResolver {
    pub fn new(
        providers: ArtistProviders,
        artists: Arc<dyn ArtistStore>,
        records: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            providers,
            artists,
            records,
            delay: DEFAULT_ARTIST_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Resolve every credited artist of `track`, then fill the track's
    /// missing artist image from the primary artist.
    pub async fn resolve_track(&self, track: &Track) -> Result<ArtistResolution> {
        let mut names: Vec<String> = parse_artists(&track.artist).into_vec();
        if names.is_empty() && !track.artist.trim().is_empty() {
            names.push(track.artist.trim().to_string());
        }

        let record = self.records.get(track.id).await?;
        let primary_mbid = record
            .as_ref()
            .and_then(|r| r.musicbrainz_artist_id.clone());

        let mut resolution = ArtistResolution::default();
        let mut primary: Option<Artist> = None;
        for (i, name) in names.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let mbid = if i == 0 { primary_mbid.as_deref() } else { None };
            match self.resolve_artist(name, mbid).await {
                Ok(artist) => {
                    if i == 0 {
                        primary = Some(artist.clone());
                    }
                    resolution.artists.push(artist);
                }
                Err(e) => {
                    warn!("Failed to resolve artist '{}': {}", name, e);
                    resolution.failed += 1;
                }
            }
        }

        if let (Some(record), Some(artist)) = (record, primary)
            && record.artist_image_url().is_none()
            && let (Some(url), Some(source)) = (artist.image_url, artist.image_source)
        {
            let patch = MetadataPatch::default().with_artist_image(source, url);
            if let Some(updated) = merge_changed(&record, &patch) {
                self.records.upsert(&updated).await?;
                resolution.record_updated = true;
                debug!("Track {} artist image filled from artist cache", track.id);
            }
        }

        Ok(resolution)
    }

    /// Resolve one artist, reusing the cache when it already has an image.
    pub async fn resolve_artist(&self, name: &str, musicbrainz_id: Option<&str>) -> Result<Artist> {
        let key = artist_key(name);
        if let Some(cached) = self.artists.get_artist(&key).await?
            && cached.has_image()
        {
            debug!("Artist '{}' served from cache", name);
            return Ok(cached);
        }

        let mut artist = self
            .artists
            .get_artist(&key)
            .await?
            .unwrap_or_else(|| Artist::new(name));

        if let Some(image) = self.find_image(name).await {
            info!("Artist image for '{}' from {}", name, image.source.as_str());
            artist.image_url = Some(image.url);
            artist.image_source = Some(image.source);
            if artist.spotify_id.is_none() {
                artist.spotify_id = image.spotify_id;
            }
            if artist.genres.is_empty() {
                artist.genres = image.genres;
            }
        } else {
            debug!("No artist image found for '{}'", name);
        }

        if artist.musicbrainz_id.is_none()
            && let Some(mbid) = musicbrainz_id
        {
            artist.musicbrainz_id = Some(mbid.to_string());
            match self.providers.musicbrainz.lookup_artist(mbid).await {
                LookupResult::Success(found) => {
                    if artist.country.is_none() {
                        artist.country = found.country;
                    }
                    if artist.genres.is_empty() {
                        artist.genres = found.genres;
                    }
                }
                other => debug!("MusicBrainz artist {}: {}", mbid, other.label()),
            }
        }

        artist.updated_at = Some(Utc::now());
        self.artists.upsert_artist(&artist).await?;
        Ok(artist)
    }

    async fn find_image(&self, name: &str) -> Option<ArtistImage> {
        let providers = &self.providers;

        if providers.spotify.is_connected()
            && let Some(image) = accept("spotify", name, providers.spotify.find_artist_image(name).await)
        {
            return Some(image);
        }
        if let Some(image) = accept("deezer", name, providers.deezer.find_artist_image(name).await) {
            return Some(image);
        }
        if let Some(image) = accept("itunes", name, providers.itunes.find_artist_image(name).await) {
            return Some(image);
        }
        if providers.lastfm.is_configured() {
            return accept("lastfm", name, providers.lastfm.artist_image(name).await);
        }
        None
    }
}

fn accept(provider: &str, name: &str, result: LookupResult<ArtistImage>) -> Option<ArtistImage> {
    match result {
        LookupResult::Success(image) if !image.url.trim().is_empty() => Some(image),
        LookupResult::Error { message, .. } => {
            warn!("{} artist image for '{}' failed: {}", provider, name, message);
            None
        }
        other => {
            debug!("{} artist image for '{}': {}", provider, name, other.label());
            None
        }
    }
}

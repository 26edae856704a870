//! Trait definitions for external API clients.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses the real client implementations, while tests
//! can substitute mock implementations.
//!
//! Every method returns a [`LookupResult`]: clients convert their own
//! failures, so callers never see a raw error.

use async_trait::async_trait;

use super::domain::{ArtistImage, AudioFeatures, AudioFeaturesSource, LookupResult, TrackQuery};
use super::merge::MetadataPatch;
use super::musicbrainz::MusicBrainzArtist;

/// Audio features together with where they came from
pub type FeaturesLookup = LookupResult<(AudioFeatures, AudioFeaturesSource)>;

#[async_trait]
pub trait SpotifyApi: Send + Sync {
    fn is_connected(&self) -> bool;

    async fn search_track(&self, query: &TrackQuery) -> LookupResult<MetadataPatch>;

    /// Artist image by name.
    async fn find_artist_image(&self, artist: &str) -> LookupResult<ArtistImage>;

    /// Artist image by Spotify artist id.
    async fn artist_image(&self, artist_id: &str) -> LookupResult<ArtistImage>;

    /// Spotify track ids of the artist's top tracks.
    async fn artist_top_tracks(&self, artist_id: &str) -> LookupResult<Vec<String>>;

    async fn audio_features(&self, track_id: &str) -> FeaturesLookup;
}

#[async_trait]
pub trait MusicBrainzApi: Send + Sync {
    async fn enrich_track(&self, query: &TrackQuery) -> LookupResult<MetadataPatch>;

    async fn lookup_artist(&self, artist_id: &str) -> LookupResult<MusicBrainzArtist>;
}

#[async_trait]
pub trait LastFmApi: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn track_tags(&self, query: &TrackQuery) -> LookupResult<MetadataPatch>;

    async fn artist_image(&self, artist: &str) -> LookupResult<ArtistImage>;
}

#[async_trait]
pub trait ITunesApi: Send + Sync {
    async fn search_track(&self, query: &TrackQuery) -> LookupResult<MetadataPatch>;

    async fn find_artist_image(&self, artist: &str) -> LookupResult<ArtistImage>;
}

#[async_trait]
pub trait DeezerApi: Send + Sync {
    async fn search_track(&self, query: &TrackQuery) -> LookupResult<MetadataPatch>;

    async fn find_artist_image(&self, artist: &str) -> LookupResult<ArtistImage>;
}

#[async_trait]
pub trait ReccoBeatsApi: Send + Sync {
    async fn features_by_spotify_id(&self, spotify_id: &str) -> FeaturesLookup;

    /// Upload a preview clip for analysis.
    async fn analyze_preview(&self, preview_url: &str) -> FeaturesLookup;
}

// Implement traits for real clients

#[async_trait]
impl SpotifyApi for super::spotify::SpotifyClient {
    fn is_connected(&self) -> bool {
        self.is_connected()
    }

    async fn search_track(&self, query: &TrackQuery) -> LookupResult<MetadataPatch> {
        self.search_track(query).await
    }

    async fn find_artist_image(&self, artist: &str) -> LookupResult<ArtistImage> {
        self.find_artist_image(artist).await
    }

    async fn artist_image(&self, artist_id: &str) -> LookupResult<ArtistImage> {
        self.artist_image(artist_id).await
    }

    async fn artist_top_tracks(&self, artist_id: &str) -> LookupResult<Vec<String>> {
        self.artist_top_tracks(artist_id).await
    }

    async fn audio_features(&self, track_id: &str) -> FeaturesLookup {
        self.audio_features(track_id).await
    }
}

#[async_trait]
impl MusicBrainzApi for super::musicbrainz::MusicBrainzClient {
    async fn enrich_track(&self, query: &TrackQuery) -> LookupResult<MetadataPatch> {
        self.enrich_track(query).await
    }

    async fn lookup_artist(&self, artist_id: &str) -> LookupResult<MusicBrainzArtist> {
        self.lookup_artist(artist_id).await
    }
}

#[async_trait]
impl LastFmApi for super::lastfm::LastFmClient {
    fn is_configured(&self) -> bool {
        self.is_configured()
    }

    async fn track_tags(&self, query: &TrackQuery) -> LookupResult<MetadataPatch> {
        self.track_tags(query).await
    }

    async fn artist_image(&self, artist: &str) -> LookupResult<ArtistImage> {
        self.artist_image(artist).await
    }
}

#[async_trait]
impl ITunesApi for super::itunes::ITunesClient {
    async fn search_track(&self, query: &TrackQuery) -> LookupResult<MetadataPatch> {
        self.search_track(query).await
    }

    async fn find_artist_image(&self, artist: &str) -> LookupResult<ArtistImage> {
        self.find_artist_image(artist).await
    }
}

#[async_trait]
impl DeezerApi for super::deezer::DeezerClient {
    async fn search_track(&self, query: &TrackQuery) -> LookupResult<MetadataPatch> {
        self.search_track(query).await
    }

    async fn find_artist_image(&self, artist: &str) -> LookupResult<ArtistImage> {
        self.find_artist_image(artist).await
    }
}

#[async_trait]
impl ReccoBeatsApi for super::reccobeats::ReccoBeatsClient {
    async fn features_by_spotify_id(&self, spotify_id: &str) -> FeaturesLookup {
        self.features_by_spotify_id(spotify_id).await
    }

    async fn analyze_preview(&self, preview_url: &str) -> FeaturesLookup {
        self.analyze_preview(preview_url).await
    }
}

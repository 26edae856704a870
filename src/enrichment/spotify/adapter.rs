//! Adapter layer: Convert Spotify DTOs to domain models

use super::dto;
use crate::enrichment::domain::{
    AlbumArtSource, ArtistImage, ArtistImageSource, AudioFeatures, AudioFeaturesSource,
    SpotifyEnrichmentStatus, TrackQuery,
};
use crate::enrichment::matching;
use crate::enrichment::merge::{AlbumArtCandidate, MetadataPatch};

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Pick the accepted candidate with the highest combined score.
pub fn select_track<'a>(
    query: &TrackQuery,
    candidates: &'a [dto::TrackObject],
) -> Option<&'a dto::TrackObject> {
    candidates
        .iter()
        .map(|track| {
            let names: Vec<String> = track.artists.iter().map(|a| a.name.clone()).collect();
            (query.score(&track.name, &names), track)
        })
        .filter(|(score, _)| score.is_accepted())
        .max_by(|(a, _), (b, _)| {
            a.combined()
                .partial_cmp(&b.combined())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(_, track)| track)
}

/// Album art with the largest image as the main/large URL and the smallest
/// as the thumbnail.
pub fn album_art(images: &[dto::Image]) -> Option<AlbumArtCandidate> {
    let usable: Vec<&dto::Image> = images.iter().filter(|i| !i.url.trim().is_empty()).collect();
    let largest = usable.iter().max_by_key(|i| i.width.unwrap_or(0))?;
    let smallest = usable.iter().min_by_key(|i| i.width.unwrap_or(u32::MAX))?;
    Some(AlbumArtCandidate {
        url: largest.url.clone(),
        small_url: Some(smallest.url.clone()),
        large_url: Some(largest.url.clone()),
        source: AlbumArtSource::Spotify,
    })
}

pub fn best_image(images: &[dto::Image]) -> Option<String> {
    images
        .iter()
        .filter(|i| !i.url.trim().is_empty())
        .max_by_key(|i| i.width.unwrap_or(0))
        .map(|i| i.url.clone())
}

/// Convert a validated track match into a metadata patch.
pub fn to_patch(track: &dto::TrackObject) -> MetadataPatch {
    MetadataPatch {
        spotify_track_id: non_blank(Some(&track.id)),
        spotify_artist_ids: track.artists.iter().filter_map(|a| a.id.clone()).collect(),
        spotify_track_url: non_blank(track.external_urls.spotify.as_deref()),
        spotify_verified_artist_name: track.artists.first().map(|a| a.name.clone()),
        album_art: track.album.as_ref().and_then(|album| album_art(&album.images)),
        preview_url: non_blank(track.preview_url.as_deref()),
        spotify_status: Some(SpotifyEnrichmentStatus::Enriched),
        ..Default::default()
    }
}

pub fn to_artist_image(artist: &dto::ArtistObject) -> Option<ArtistImage> {
    let url = best_image(&artist.images)?;
    Some(ArtistImage {
        spotify_id: Some(artist.id.clone()),
        genres: artist.genres.clone(),
        ..ArtistImage::new(url, ArtistImageSource::Spotify)
    })
}

/// Best artist search hit whose name matches and that has an image.
pub fn select_artist<'a>(
    wanted: &str,
    candidates: &'a [dto::ArtistObject],
) -> Option<&'a dto::ArtistObject> {
    candidates
        .iter()
        .filter(|a| !a.images.is_empty())
        .map(|a| (matching::similarity(wanted, &a.name), a))
        .filter(|(score, _)| matching::meets(*score, matching::CONTAINMENT_SCORE))
        .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, artist)| artist)
}

/// Artist id credited on a track search hit for the wanted artist.
pub fn artist_id_from_tracks(wanted: &str, tracks: &[dto::TrackObject]) -> Option<String> {
    tracks
        .iter()
        .flat_map(|t| t.artists.iter())
        .find(|a| matching::artist_matches(wanted, &a.name, matching::CONTAINMENT_SCORE))
        .and_then(|a| a.id.clone())
}

pub fn to_audio_features(dto: &dto::AudioFeaturesObject) -> (AudioFeatures, AudioFeaturesSource) {
    (
        AudioFeatures {
            acousticness: dto.acousticness,
            danceability: dto.danceability,
            energy: dto.energy,
            instrumentalness: dto.instrumentalness,
            liveness: dto.liveness,
            loudness: dto.loudness,
            speechiness: dto.speechiness,
            tempo: dto.tempo,
            valence: dto.valence,
            key: dto.key.filter(|k| *k >= 0),
            mode: dto.mode,
            time_signature: dto.time_signature,
        },
        AudioFeaturesSource::Spotify,
    )
}

//! Adapter layer: Convert Deezer DTOs to domain models

use super::dto;
use crate::enrichment::domain::{
    AlbumArtSource, ArtistImage, ArtistImageSource, EnrichmentError, TrackQuery,
};
use crate::enrichment::matching::{ARTIST_THRESHOLD, meets, similarity};
use crate::enrichment::merge::{AlbumArtCandidate, MetadataPatch};

/// Artists without a photo get a picture URL with an empty hash segment,
/// e.g. `.../images/artist//500x500-000000-80-0-0.jpg`.
pub fn is_placeholder_picture(url: &str) -> bool {
    url.contains("/artist//") || url.trim().is_empty()
}

pub fn to_error(error: &dto::ApiError) -> EnrichmentError {
    match error.code {
        Some(4) => EnrichmentError::RateLimited,
        Some(800) => EnrichmentError::NoMatches,
        Some(code) => EnrichmentError::ApiError(format!("Deezer error {}: {}", code, error.message)),
        None => EnrichmentError::ApiError(format!("Deezer error: {}", error.message)),
    }
}

pub fn album_art(album: &dto::Album) -> Option<AlbumArtCandidate> {
    let large = album
        .cover_xl
        .clone()
        .or_else(|| album.cover_big.clone())
        .filter(|u| !u.trim().is_empty())?;
    Some(AlbumArtCandidate {
        url: album.cover_big.clone().unwrap_or_else(|| large.clone()),
        small_url: album.cover_medium.clone(),
        large_url: Some(large),
        source: AlbumArtSource::Deezer,
    })
}

pub fn select_track<'a>(query: &TrackQuery, tracks: &'a [dto::Track]) -> Option<&'a dto::Track> {
    tracks
        .iter()
        .map(|t| (query.score(&t.title, std::slice::from_ref(&t.artist.name)), t))
        .filter(|(score, _)| score.is_accepted())
        .max_by(|(a, _), (b, _)| {
            a.combined()
                .partial_cmp(&b.combined())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(_, t)| t)
}

pub fn to_patch(track: &dto::Track) -> MetadataPatch {
    let patch = MetadataPatch {
        album_art: track.album.as_ref().and_then(album_art),
        preview_url: track.preview.clone().filter(|p| !p.trim().is_empty()),
        ..Default::default()
    };
    match artist_picture(&track.artist) {
        Some(url) => patch.with_artist_image(ArtistImageSource::Deezer, url),
        None => patch,
    }
}

fn artist_picture(artist: &dto::Artist) -> Option<String> {
    [&artist.picture_xl, &artist.picture_big, &artist.picture_medium, &artist.picture]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .find(|p| !is_placeholder_picture(p))
        .map(str::to_string)
}

/// Best-named artist with a real picture; the most followed wins ties.
pub fn select_artist_image(wanted: &str, artists: &[dto::Artist]) -> Option<ArtistImage> {
    artists
        .iter()
        .map(|a| (similarity(wanted, &a.name), a))
        .filter(|(score, _)| meets(*score, ARTIST_THRESHOLD))
        .filter_map(|(score, a)| artist_picture(a).map(|url| (score, a, url)))
        .max_by(|(sa, a, _), (sb, b, _)| {
            sa.partial_cmp(sb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.nb_fan.cmp(&b.nb_fan))
        })
        .map(|(_, _, url)| ArtistImage::new(url, ArtistImageSource::Deezer))
}

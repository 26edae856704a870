//! Adapter layer: Convert iTunes DTOs to domain models

use super::dto;
use crate::enrichment::domain::{AlbumArtSource, TrackQuery};
use crate::enrichment::matching::{ARTIST_THRESHOLD, artist_matches, meets, similarity};
use crate::enrichment::merge::{AlbumArtCandidate, MetadataPatch};

const THUMB_SIZE: &str = "100x100bb";
pub const LARGE_SIZE: &str = "600x600bb";
pub const SMALL_SIZE: &str = "300x300bb";

/// Swap the 100px thumbnail size token for another size.
pub fn resize_artwork(url: &str, size: &str) -> String {
    url.replace(THUMB_SIZE, size)
}

pub fn album_art(artwork_url100: &str) -> Option<AlbumArtCandidate> {
    let url = artwork_url100.trim();
    if url.is_empty() {
        return None;
    }
    let large = resize_artwork(url, LARGE_SIZE);
    Some(AlbumArtCandidate {
        url: large.clone(),
        small_url: Some(resize_artwork(url, SMALL_SIZE)),
        large_url: Some(large),
        source: AlbumArtSource::ITunes,
    })
}

/// Best validated song result.
pub fn select_song<'a>(query: &TrackQuery, songs: &'a [dto::SongResult]) -> Option<&'a dto::SongResult> {
    songs
        .iter()
        .filter(|s| s.kind.as_deref().is_none_or(|k| k == "song"))
        .filter_map(|s| {
            let title = s.track_name.as_deref()?;
            let artist = s.artist_name.clone()?;
            Some((query.score(title, &[artist]), s))
        })
        .filter(|(score, _)| score.is_accepted())
        .max_by(|(a, _), (b, _)| {
            a.combined()
                .partial_cmp(&b.combined())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(_, s)| s)
}

pub fn to_patch(song: &dto::SongResult) -> MetadataPatch {
    MetadataPatch {
        album_art: song.artwork_url100.as_deref().and_then(album_art),
        preview_url: song.preview_url.clone(),
        apple_music_url: song.track_view_url.clone(),
        ..Default::default()
    }
}

/// Artist page link for the best-matching artist search result.
pub fn select_artist_page(wanted: &str, artists: &[dto::ArtistResult]) -> Option<String> {
    artists
        .iter()
        .map(|a| (similarity(wanted, &a.artist_name), a))
        .filter(|(score, a)| meets(*score, ARTIST_THRESHOLD) && a.artist_link_url.is_some())
        .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .and_then(|(_, a)| a.artist_link_url.clone())
}

/// Artist page derived from song results credited to the wanted artist.
pub fn artist_page_from_songs(wanted: &str, songs: &[dto::SongResult]) -> Option<String> {
    songs
        .iter()
        .filter(|s| {
            s.artist_name
                .as_deref()
                .is_some_and(|name| artist_matches(wanted, name, ARTIST_THRESHOLD))
        })
        .find_map(|s| s.artist_view_url.clone())
}

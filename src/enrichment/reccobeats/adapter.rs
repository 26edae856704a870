//! Adapter layer: Convert ReccoBeats DTOs to domain models

use super::dto;
use crate::enrichment::domain::{AudioFeatures, AudioFeaturesSource};

pub fn to_audio_features(
    dto: &dto::AudioFeatures,
    source: AudioFeaturesSource,
) -> (AudioFeatures, AudioFeaturesSource) {
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
            key: dto.key.filter(|k| (0..=11).contains(k)),
            mode: dto.mode.filter(|m| *m == 0 || *m == 1),
            time_signature: None,
        },
        source,
    )
}

/// The ReccoBeats id of the track whose Spotify link matches, or the only result.
pub fn select_track<'a>(spotify_id: &str, tracks: &'a [dto::Track]) -> Option<&'a dto::Track> {
    tracks
        .iter()
        .find(|t| t.href.as_deref().is_some_and(|h| h.ends_with(spotify_id)))
        .or(if tracks.len() == 1 { tracks.first() } else { None })
}

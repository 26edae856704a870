//! Gap analysis: which metadata fields are still missing for a track.

use bitflags::bitflags;

use super::domain::EnrichedMetadata;

bitflags! {
    /// Fields still missing from a metadata record.
    ///
    /// Derived fresh on every enrichment pass and never persisted. An empty
    /// gap means enrichment for the track is complete.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EnrichmentGap: u8 {
        const ALBUM_ART = 1 << 0;
        const GENRES = 1 << 1;
        const AUDIO_FEATURES = 1 << 2;
        const ARTIST_IMAGE = 1 << 3;
        const PREVIEW_URL = 1 << 4;
    }
}

impl EnrichmentGap {
    pub fn missing_album_art(&self) -> bool {
        self.contains(Self::ALBUM_ART)
    }

    pub fn missing_genres(&self) -> bool {
        self.contains(Self::GENRES)
    }

    pub fn missing_audio_features(&self) -> bool {
        self.contains(Self::AUDIO_FEATURES)
    }

    pub fn missing_artist_image(&self) -> bool {
        self.contains(Self::ARTIST_IMAGE)
    }

    pub fn missing_preview_url(&self) -> bool {
        self.contains(Self::PREVIEW_URL)
    }

    /// Lowercase flag names, e.g. `album_art, genres`.
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "none".to_string();
        }
        self.iter_names()
            .map(|(name, _)| name.to_lowercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for EnrichmentGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// Compute the gap for a (possibly absent) metadata record.
pub fn compute_gap(metadata: Option<&EnrichedMetadata>) -> EnrichmentGap {
    let Some(meta) = metadata else {
        return EnrichmentGap::all();
    };

    let mut gap = EnrichmentGap::empty();
    if is_blank(&meta.album_art_url) {
        gap |= EnrichmentGap::ALBUM_ART;
    }
    if meta.genres().is_empty() {
        gap |= EnrichmentGap::GENRES;
    }
    if is_blank(&meta.audio_features_json) {
        gap |= EnrichmentGap::AUDIO_FEATURES;
    }
    if meta.artist_image_url().is_none() {
        gap |= EnrichmentGap::ARTIST_IMAGE;
    }
    if is_blank(&meta.preview_url) {
        gap |= EnrichmentGap::PREVIEW_URL;
    }
    gap
}

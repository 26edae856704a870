//! Fill-gaps-only merging of provider results into a metadata record.
//!
//! Every field except album art is written only when the current value is
//! absent or blank. Album art is arbitrated by [`AlbumArtSource`] rank.

use chrono::Utc;

use super::domain::{
    AlbumArtSource, ArtistImageSource, AudioFeatures, AudioFeaturesSource, EnrichedMetadata,
    SpotifyEnrichmentStatus,
};

/// Album art offered by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumArtCandidate {
    pub url: String,
    pub small_url: Option<String>,
    pub large_url: Option<String>,
    pub source: AlbumArtSource,
}

/// Everything a single provider call may contribute to a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataPatch {
    pub musicbrainz_recording_id: Option<String>,
    pub musicbrainz_artist_id: Option<String>,
    pub musicbrainz_release_id: Option<String>,
    pub musicbrainz_release_group_id: Option<String>,
    pub album_title: Option<String>,
    pub release_date: Option<String>,
    pub release_year: Option<i32>,
    pub musicbrainz_tags: Vec<String>,
    pub musicbrainz_genres: Vec<String>,
    pub record_label: Option<String>,

    pub spotify_track_id: Option<String>,
    pub spotify_artist_ids: Vec<String>,
    pub spotify_track_url: Option<String>,
    pub spotify_verified_artist_name: Option<String>,
    pub spotify_artist_image_url: Option<String>,

    pub itunes_artist_image_url: Option<String>,
    pub apple_music_url: Option<String>,

    pub deezer_artist_image_url: Option<String>,

    pub lastfm_tags: Vec<String>,
    pub lastfm_artist_image_url: Option<String>,
    pub lastfm_url: Option<String>,

    pub audio_features: Option<(AudioFeatures, AudioFeaturesSource)>,

    pub album_art: Option<AlbumArtCandidate>,
    pub preview_url: Option<String>,

    /// Spotify sub-state; applied when present unless the record is already ENRICHED
    pub spotify_status: Option<SpotifyEnrichmentStatus>,
}

impl MetadataPatch {
    /// Put an artist image into the field owned by its provider.
    pub fn with_artist_image(mut self, source: ArtistImageSource, url: impl Into<String>) -> Self {
        let url = Some(url.into());
        match source {
            ArtistImageSource::Spotify => self.spotify_artist_image_url = url,
            ArtistImageSource::ITunes => self.itunes_artist_image_url = url,
            ArtistImageSource::Deezer => self.deezer_artist_image_url = url,
            ArtistImageSource::LastFm => self.lastfm_artist_image_url = url,
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == MetadataPatch::default()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

fn fill(slot: &mut Option<String>, value: &Option<String>) {
    if !is_blank(slot) {
        return;
    }
    if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        *slot = Some(v.to_string());
    }
}

fn fill_copy<T: Copy>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn fill_list(slot: &mut Vec<String>, values: &[String]) {
    if !slot.is_empty() {
        return;
    }
    let cleaned: Vec<String> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    if !cleaned.is_empty() {
        *slot = cleaned;
    }
}

/// Apply a patch to a copy of `current` and return the merged record.
///
/// Does not touch bookkeeping timestamps; see [`merge_changed`].
pub fn apply_patch(current: &EnrichedMetadata, patch: &MetadataPatch) -> EnrichedMetadata {
    let mut merged = current.clone();

    fill(&mut merged.musicbrainz_recording_id, &patch.musicbrainz_recording_id);
    fill(&mut merged.musicbrainz_artist_id, &patch.musicbrainz_artist_id);
    fill(&mut merged.musicbrainz_release_id, &patch.musicbrainz_release_id);
    fill(
        &mut merged.musicbrainz_release_group_id,
        &patch.musicbrainz_release_group_id,
    );
    fill(&mut merged.album_title, &patch.album_title);
    fill(&mut merged.release_date, &patch.release_date);
    fill_copy(&mut merged.release_year, patch.release_year);
    fill_list(&mut merged.musicbrainz_tags, &patch.musicbrainz_tags);
    fill_list(&mut merged.musicbrainz_genres, &patch.musicbrainz_genres);
    fill(&mut merged.record_label, &patch.record_label);

    fill(&mut merged.spotify_track_id, &patch.spotify_track_id);
    fill_list(&mut merged.spotify_artist_ids, &patch.spotify_artist_ids);
    fill(&mut merged.spotify_track_url, &patch.spotify_track_url);
    fill(
        &mut merged.spotify_verified_artist_name,
        &patch.spotify_verified_artist_name,
    );
    fill(&mut merged.spotify_artist_image_url, &patch.spotify_artist_image_url);

    fill(&mut merged.itunes_artist_image_url, &patch.itunes_artist_image_url);
    fill(&mut merged.apple_music_url, &patch.apple_music_url);

    fill(&mut merged.deezer_artist_image_url, &patch.deezer_artist_image_url);

    fill_list(&mut merged.lastfm_tags, &patch.lastfm_tags);
    fill(&mut merged.lastfm_artist_image_url, &patch.lastfm_artist_image_url);
    fill(&mut merged.lastfm_url, &patch.lastfm_url);

    if is_blank(&merged.audio_features_json)
        && let Some((features, source)) = &patch.audio_features
    {
        merged.audio_features_json = Some(features.to_json());
        merged.audio_features_source = Some(*source);
    }

    if let Some(art) = &patch.album_art {
        // A blank stored URL carries no rank, whatever its recorded source says.
        let current_source = if is_blank(&merged.album_art_url) {
            AlbumArtSource::None
        } else {
            merged.album_art_source
        };
        if current_source.should_be_replaced_by(art.source, &art.url) {
            merged.album_art_url = Some(art.url.trim().to_string());
            merged.album_art_small_url = art.small_url.clone();
            merged.album_art_large_url = art.large_url.clone();
            merged.album_art_source = art.source;
        }
    }

    fill(&mut merged.preview_url, &patch.preview_url);

    // ENRICHED is terminal: a later failed or skipped pass never demotes it
    if let Some(status) = patch.spotify_status
        && merged.spotify_enrichment_status != SpotifyEnrichmentStatus::Enriched
    {
        merged.spotify_enrichment_status = status;
    }

    merged
}

/// Merge a patch and return the new record only if something changed.
///
/// A changed record gets a fresh `cache_timestamp`.
pub fn merge_changed(current: &EnrichedMetadata, patch: &MetadataPatch) -> Option<EnrichedMetadata> {
    let mut merged = apply_patch(current, patch);
    if merged == *current {
        return None;
    }
    merged.cache_timestamp = Some(Utc::now());
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn art(source: AlbumArtSource, url: &str) -> MetadataPatch {
        MetadataPatch {
            album_art: Some(AlbumArtCandidate {
                url: url.to_string(),
                small_url: None,
                large_url: None,
                source,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_fill_only_keeps_existing_values() {
        let current = EnrichedMetadata {
            album_title: Some("After Hours".into()),
            ..EnrichedMetadata::new_pending(1)
        };
        let patch = MetadataPatch {
            album_title: Some("Blinding Lights (Single)".into()),
            release_year: Some(2019),
            ..Default::default()
        };
        let merged = apply_patch(&current, &patch);
        assert_eq!(merged.album_title.as_deref(), Some("After Hours"));
        assert_eq!(merged.release_year, Some(2019));
    }

    #[test]
    fn test_blank_existing_value_is_filled() {
        let current = EnrichedMetadata {
            preview_url: Some("  ".into()),
            ..EnrichedMetadata::new_pending(1)
        };
        let patch = MetadataPatch {
            preview_url: Some("https://p.scdn.co/mp3-preview/abc".into()),
            ..Default::default()
        };
        let merged = apply_patch(&current, &patch);
        assert_eq!(
            merged.preview_url.as_deref(),
            Some("https://p.scdn.co/mp3-preview/abc")
        );
    }

    #[test]
    fn test_album_art_upgrade_and_no_downgrade() {
        let current = EnrichedMetadata::new_pending(1);
        let with_deezer = apply_patch(&current, &art(AlbumArtSource::Deezer, "https://dz/1.jpg"));
        assert_eq!(with_deezer.album_art_source, AlbumArtSource::Deezer);

        let with_spotify =
            apply_patch(&with_deezer, &art(AlbumArtSource::Spotify, "https://sp/1.jpg"));
        assert_eq!(with_spotify.album_art_source, AlbumArtSource::Spotify);
        assert_eq!(with_spotify.album_art_url.as_deref(), Some("https://sp/1.jpg"));

        let after_itunes =
            apply_patch(&with_spotify, &art(AlbumArtSource::ITunes, "https://it/1.jpg"));
        assert_eq!(after_itunes, with_spotify);
    }

    #[test]
    fn test_blank_album_art_never_wins() {
        let current = apply_patch(
            &EnrichedMetadata::new_pending(1),
            &art(AlbumArtSource::Deezer, "https://dz/1.jpg"),
        );
        let merged = apply_patch(&current, &art(AlbumArtSource::Spotify, ""));
        assert_eq!(merged.album_art_source, AlbumArtSource::Deezer);
    }

    #[test]
    fn test_spotify_enriched_is_never_demoted() {
        let status = |s| MetadataPatch {
            spotify_status: Some(s),
            ..Default::default()
        };
        let current = EnrichedMetadata::new_pending(1);
        let failed = apply_patch(&current, &status(SpotifyEnrichmentStatus::Failed));
        assert_eq!(failed.spotify_enrichment_status, SpotifyEnrichmentStatus::Failed);

        let enriched = apply_patch(&failed, &status(SpotifyEnrichmentStatus::Enriched));
        assert_eq!(enriched.spotify_enrichment_status, SpotifyEnrichmentStatus::Enriched);

        for worse in [
            SpotifyEnrichmentStatus::Failed,
            SpotifyEnrichmentStatus::Skipped,
            SpotifyEnrichmentStatus::NotFound,
        ] {
            assert!(merge_changed(&enriched, &status(worse)).is_none());
        }
    }

    #[test]
    fn test_merge_changed_detects_noop() {
        let current = EnrichedMetadata {
            preview_url: Some("https://a".into()),
            ..EnrichedMetadata::new_pending(1)
        };
        let patch = MetadataPatch {
            preview_url: Some("https://b".into()),
            ..Default::default()
        };
        assert!(merge_changed(&current, &patch).is_none());
        assert!(merge_changed(&current, &MetadataPatch::default()).is_none());
    }

    #[test]
    fn test_merge_changed_stamps_cache_timestamp() {
        let current = EnrichedMetadata::new_pending(1);
        let patch = MetadataPatch {
            lastfm_tags: vec!["pop".into()],
            ..Default::default()
        };
        let merged = merge_changed(&current, &patch).unwrap();
        assert!(merged.cache_timestamp.is_some());
        assert_eq!(merged.lastfm_tags, vec!["pop".to_string()]);
    }

    #[test]
    fn test_with_artist_image_routes_to_provider_field() {
        let patch = MetadataPatch::default()
            .with_artist_image(ArtistImageSource::ITunes, "https://is1-ssl.mzstatic.com/a.jpg");
        assert!(patch.itunes_artist_image_url.is_some());
        assert!(patch.deezer_artist_image_url.is_none());
    }
}

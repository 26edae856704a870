//! Adapter layer: Convert MusicBrainz DTOs to domain models
//!
//! This is the ONLY place where DTO types are converted to domain types.
//! This isolates API changes - if MusicBrainz changes their response format,
//! only this file and dto.rs need to change.

use super::dto;
use crate::enrichment::domain::TrackQuery;
use crate::enrichment::merge::MetadataPatch;

/// Search hits below this relevance are ignored
pub const MIN_SEARCH_SCORE: u32 = 70;

/// Keep only the most-voted genres/tags to avoid noise
const MAX_TAGS: usize = 5;

/// Names credited on a recording, in credit order
pub fn credited_names(credits: &[dto::ArtistCredit]) -> Vec<String> {
    credits
        .iter()
        .map(|c| c.name.clone().unwrap_or_else(|| c.artist.name.clone()))
        .collect()
}

/// Pick the best validated search hit.
pub fn select_recording<'a>(
    query: &TrackQuery,
    recordings: &'a [dto::RecordingResponse],
) -> Option<&'a dto::RecordingResponse> {
    recordings
        .iter()
        .filter(|r| r.score.unwrap_or(100) >= MIN_SEARCH_SCORE)
        .map(|r| (query.score(&r.title, &credited_names(&r.artist_credit)), r))
        .filter(|(score, _)| score.is_accepted())
        .max_by(|(a, ra), (b, rb)| {
            a.combined()
                .partial_cmp(&b.combined())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ra.score.cmp(&rb.score))
        })
        .map(|(_, r)| r)
}

fn earliest<'a>(candidates: impl IntoIterator<Item = &'a dto::Release>) -> Option<&'a dto::Release> {
    candidates.into_iter().min_by(|a, b| match (&a.date, &b.date) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    })
}

/// Prefer an official studio album, then any official release, then the
/// earliest dated one.
pub fn select_release(releases: &[dto::Release]) -> Option<&dto::Release> {
    let is_official = |r: &&dto::Release| r.status.as_deref() == Some("Official");
    let is_studio_album = |r: &&dto::Release| {
        r.release_group.as_ref().is_some_and(|rg| {
            rg.primary_type.as_deref() == Some("Album") && rg.secondary_types.is_empty()
        })
    };

    earliest(releases.iter().filter(is_official).filter(is_studio_album))
        .or_else(|| earliest(releases.iter().filter(is_official)))
        .or_else(|| earliest(releases))
}

/// Parse year from date (YYYY, YYYY-MM, or YYYY-MM-DD)
pub fn year_from_date(date: &str) -> Option<i32> {
    date.split('-').next().and_then(|y| y.trim().parse().ok())
}

/// Tag names sorted by vote count (most popular first)
pub fn extract_tags(tags: &[dto::Tag]) -> Vec<String> {
    let mut sorted: Vec<_> = tags.iter().filter(|t| t.count > 0).collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted
        .into_iter()
        .take(MAX_TAGS)
        .map(|t| t.name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Convert a looked-up recording to a metadata patch
pub fn to_patch(recording: &dto::RecordingResponse) -> MetadataPatch {
    let release = select_release(&recording.releases);
    let release_date = release.and_then(|r| r.date.clone()).filter(|d| !d.is_empty());

    MetadataPatch {
        musicbrainz_recording_id: Some(recording.id.clone()),
        musicbrainz_artist_id: recording.artist_credit.first().map(|c| c.artist.id.clone()),
        musicbrainz_release_id: release.map(|r| r.id.clone()),
        musicbrainz_release_group_id: release
            .and_then(|r| r.release_group.as_ref())
            .map(|rg| rg.id.clone()),
        album_title: release.map(|r| r.title.clone()),
        release_year: release_date.as_deref().and_then(year_from_date),
        release_date,
        musicbrainz_genres: extract_tags(&recording.genres),
        musicbrainz_tags: extract_tags(&recording.tags),
        ..Default::default()
    }
}

/// First named label on a release
pub fn label_name(release: &dto::ReleaseResponse) -> Option<String> {
    release
        .label_info
        .iter()
        .filter_map(|info| info.label.as_ref())
        .map(|label| label.name.trim())
        .find(|name| !name.is_empty() && !name.eq_ignore_ascii_case("[no label]"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_recording(id: &str, title: &str, artist: &str, score: u32) -> dto::RecordingResponse {
        dto::RecordingResponse {
            id: id.to_string(),
            score: Some(score),
            title: title.to_string(),
            length: None,
            disambiguation: None,
            artist_credit: vec![dto::ArtistCredit {
                artist: dto::Artist {
                    id: format!("{}-id", artist.to_lowercase()),
                    name: artist.to_string(),
                    sort_name: None,
                },
                name: Some(artist.to_string()),
                joinphrase: None,
            }],
            releases: vec![],
            genres: vec![],
            tags: vec![],
        }
    }

    fn make_release(id: &str, status: &str, date: Option<&str>, kind: &str) -> dto::Release {
        dto::Release {
            id: id.to_string(),
            title: format!("{} title", id),
            status: Some(status.to_string()),
            date: date.map(String::from),
            country: None,
            release_group: Some(dto::ReleaseGroup {
                id: format!("{}-rg", id),
                title: None,
                primary_type: Some(kind.to_string()),
                secondary_types: vec![],
            }),
        }
    }

    fn tag(name: &str, count: i32) -> dto::Tag {
        dto::Tag {
            name: name.to_string(),
            count,
        }
    }

    #[test]
    fn test_select_recording_validates_artist() {
        let query = TrackQuery::new("Blinding Lights", "The Weeknd", None);
        let recordings = vec![
            make_recording("karaoke", "Blinding Lights", "Sing King", 100),
            make_recording("real", "Blinding Lights", "The Weeknd", 98),
        ];
        assert_eq!(select_recording(&query, &recordings).unwrap().id, "real");
    }

    #[test]
    fn test_select_recording_ignores_low_relevance() {
        let query = TrackQuery::new("Blinding Lights", "The Weeknd", None);
        let recordings = vec![make_recording("weak", "Blinding Lights", "The Weeknd", 40)];
        assert!(select_recording(&query, &recordings).is_none());
    }

    #[test]
    fn test_select_release_prefers_official_album() {
        let releases = vec![
            make_release("single", "Official", Some("2019-11-29"), "Single"),
            make_release("bootleg", "Bootleg", Some("2019-01-01"), "Album"),
            make_release("album-late", "Official", Some("2021-01-01"), "Album"),
            make_release("album", "Official", Some("2020-03-20"), "Album"),
        ];
        assert_eq!(select_release(&releases).unwrap().id, "album");
    }

    #[test]
    fn test_select_release_falls_back_to_earliest() {
        let releases = vec![
            make_release("b", "Bootleg", None, "Single"),
            make_release("a", "Promotion", Some("2019-11-29"), "Single"),
        ];
        assert_eq!(select_release(&releases).unwrap().id, "a");
        assert!(select_release(&[]).is_none());
    }

    #[test]
    fn test_extract_tags_sorted_by_votes() {
        let tags = vec![tag("80s", 2), tag("synth-pop", 7), tag("spam", 0), tag("pop", 3)];
        assert_eq!(extract_tags(&tags), vec!["synth-pop", "pop", "80s"]);
    }

    #[test]
    fn test_to_patch() {
        let mut recording = make_recording("rec-1", "Blinding Lights", "The Weeknd", 100);
        recording.releases = vec![make_release("rel-1", "Official", Some("2020-03-20"), "Album")];
        recording.genres = vec![tag("synth-pop", 5)];
        let patch = to_patch(&recording);
        assert_eq!(patch.musicbrainz_recording_id.as_deref(), Some("rec-1"));
        assert_eq!(patch.musicbrainz_artist_id.as_deref(), Some("the weeknd-id"));
        assert_eq!(patch.musicbrainz_release_group_id.as_deref(), Some("rel-1-rg"));
        assert_eq!(patch.release_year, Some(2020));
        assert_eq!(patch.musicbrainz_genres, vec!["synth-pop".to_string()]);
        assert!(patch.album_art.is_none());
    }

    #[test]
    fn test_year_from_date() {
        assert_eq!(year_from_date("1975-10-31"), Some(1975));
        assert_eq!(year_from_date("1975"), Some(1975));
        assert_eq!(year_from_date(""), None);
    }

    #[test]
    fn test_label_name_skips_placeholder() {
        let release = dto::ReleaseResponse {
            id: "r".into(),
            title: "t".into(),
            label_info: vec![
                dto::LabelInfo {
                    catalog_number: None,
                    label: Some(dto::Label {
                        id: None,
                        name: "[no label]".into(),
                    }),
                },
                dto::LabelInfo {
                    catalog_number: None,
                    label: Some(dto::Label {
                        id: None,
                        name: "XO".into(),
                    }),
                },
            ],
        };
        assert_eq!(label_name(&release).as_deref(), Some("XO"));
    }
}

//! MusicBrainz API Data Transfer Objects
//!
//! These types match EXACTLY what the MusicBrainz API returns.
//! DO NOT add fields that aren't in the API response.
//! DO NOT use these types outside the musicbrainz module - convert to domain types.
//!
//! API Reference: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! We use `/recording?query=` to find candidates, then look the best one up
//! by MBID with genres, tags and release groups included.

use serde::{Deserialize, Serialize};

/// Recording search response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub recordings: Vec<RecordingResponse>,
    pub count: Option<u32>,
}

/// Recording (search hit or lookup with includes)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RecordingResponse {
    /// MusicBrainz recording ID
    pub id: String,
    /// Search relevance 0-100 (search results only)
    pub score: Option<u32>,
    /// Track title
    pub title: String,
    /// Duration in milliseconds
    pub length: Option<u64>,
    /// Disambiguation comment
    pub disambiguation: Option<String>,
    /// Artist credits
    #[serde(default)]
    pub artist_credit: Vec<ArtistCredit>,
    /// Releases this recording appears on
    #[serde(default)]
    pub releases: Vec<Release>,
    /// Curated genres (`inc=genres`)
    #[serde(default)]
    pub genres: Vec<Tag>,
    /// Folksonomy tags (`inc=tags`)
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Artist credit (can be multiple for collaborations)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistCredit {
    /// The artist
    pub artist: Artist,
    /// How this artist is credited (may differ from official name)
    pub name: Option<String>,
    /// Join phrase (e.g., " & ", " feat. ")
    pub joinphrase: Option<String>,
}

/// Artist info
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Artist {
    /// MusicBrainz artist ID
    pub id: String,
    /// Official artist name
    pub name: String,
    /// Sort name (e.g., "Weeknd, The")
    pub sort_name: Option<String>,
}

/// Artist lookup (`/artist/{id}?inc=genres+tags`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistResponse {
    pub id: String,
    pub name: String,
    /// ISO country code
    pub country: Option<String>,
    #[serde(default)]
    pub genres: Vec<Tag>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Release (album/single/EP)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Release {
    /// MusicBrainz release ID
    pub id: String,
    /// Release title
    pub title: String,
    /// Release status (Official, Bootleg, etc.)
    pub status: Option<String>,
    /// Release date (YYYY, YYYY-MM, or YYYY-MM-DD)
    pub date: Option<String>,
    /// Country code
    pub country: Option<String>,
    /// Release group (groups same album across editions)
    pub release_group: Option<ReleaseGroup>,
}

/// Release group (e.g., "After Hours" across all editions)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseGroup {
    /// MusicBrainz release group ID
    pub id: String,
    /// Title
    pub title: Option<String>,
    /// Primary type (Album, Single, EP, etc.)
    pub primary_type: Option<String>,
    /// Secondary types (Compilation, Live, Remix, ...)
    #[serde(default)]
    pub secondary_types: Vec<String>,
}

/// Release lookup with `inc=labels`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseResponse {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub label_info: Vec<LabelInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LabelInfo {
    pub catalog_number: Option<String>,
    pub label: Option<Label>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Label {
    pub id: Option<String>,
    pub name: String,
}

/// Genre or tag with vote count
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub count: i32,
}

/// Error response from MusicBrainz API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: String,
    pub help: Option<String>,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================

#[cfg(test)]
mod contract_tests {
    use super::*;

    /// Test parsing a minimal recording response
    #[test]
    fn test_parse_minimal_recording() {
        let json = r#"{
            "id": "abc123",
            "title": "Test Song"
        }"#;

        let recording: RecordingResponse =
            serde_json::from_str(json).expect("Should parse minimal recording");

        assert_eq!(recording.id, "abc123");
        assert_eq!(recording.title, "Test Song");
        assert!(recording.length.is_none());
        assert!(recording.artist_credit.is_empty());
        assert!(recording.releases.is_empty());
        assert!(recording.genres.is_empty());
    }

    /// Test parsing a search response with scores
    #[test]
    fn test_parse_search_response() {
        let json = r#"{
            "created": "2024-01-01T00:00:00.000Z",
            "count": 1,
            "offset": 0,
            "recordings": [{
                "id": "rec-1",
                "score": 100,
                "title": "Blinding Lights",
                "length": 200040,
                "artist-credit": [{
                    "name": "The Weeknd",
                    "joinphrase": "",
                    "artist": {"id": "c8b03190", "name": "The Weeknd", "sort-name": "Weeknd, The"}
                }],
                "releases": [{
                    "id": "rel-1",
                    "title": "After Hours",
                    "status": "Official",
                    "date": "2020-03-20",
                    "release-group": {
                        "id": "rg-1",
                        "title": "After Hours",
                        "primary-type": "Album",
                        "secondary-types": []
                    }
                }]
            }]
        }"#;

        let response: SearchResponse =
            serde_json::from_str(json).expect("Should parse search response");
        assert_eq!(response.recordings.len(), 1);
        let recording = &response.recordings[0];
        assert_eq!(recording.score, Some(100));
        assert_eq!(recording.artist_credit[0].artist.name, "The Weeknd");
        let rg = recording.releases[0].release_group.as_ref().unwrap();
        assert_eq!(rg.primary_type.as_deref(), Some("Album"));
    }

    /// Test parsing recording lookup with genres and tags
    #[test]
    fn test_parse_recording_with_genres() {
        let json = r#"{
            "id": "rec-1",
            "title": "Blinding Lights",
            "genres": [{"name": "synth-pop", "count": 5, "id": "g1", "disambiguation": ""}],
            "tags": [{"name": "80s", "count": 2}, {"name": "synthwave", "count": 3}]
        }"#;

        let recording: RecordingResponse =
            serde_json::from_str(json).expect("Should parse recording with genres");
        assert_eq!(recording.genres[0].name, "synth-pop");
        assert_eq!(recording.tags.len(), 2);
    }

    /// Test parsing collaboration (multiple artist credits)
    #[test]
    fn test_parse_collaboration() {
        let json = r#"{
            "id": "rec-collab",
            "title": "Under Pressure",
            "artist-credit": [
                {
                    "artist": {"id": "queen-id", "name": "Queen"},
                    "joinphrase": " & "
                },
                {
                    "artist": {"id": "bowie-id", "name": "David Bowie"},
                    "joinphrase": ""
                }
            ]
        }"#;

        let recording: RecordingResponse =
            serde_json::from_str(json).expect("Should parse collaboration");

        assert_eq!(recording.artist_credit.len(), 2);
        assert_eq!(recording.artist_credit[0].artist.name, "Queen");
        assert_eq!(recording.artist_credit[0].joinphrase, Some(" & ".to_string()));
        assert_eq!(recording.artist_credit[1].artist.name, "David Bowie");
    }

    #[test]
    fn test_parse_release_labels() {
        let json = r#"{
            "id": "rel-1",
            "title": "After Hours",
            "label-info": [{"catalog-number": "B0031686-02", "label": {"id": "l1", "name": "Republic Records"}}]
        }"#;
        let release: ReleaseResponse = serde_json::from_str(json).expect("Should parse release");
        assert_eq!(
            release.label_info[0].label.as_ref().unwrap().name,
            "Republic Records"
        );
    }

    #[test]
    fn test_parse_artist_lookup() {
        let json = r#"{"id": "a1", "name": "The Weeknd", "country": "CA", "genres": [{"name": "r&b", "count": 4}]}"#;
        let artist: ArtistResponse = serde_json::from_str(json).expect("Should parse artist");
        assert_eq!(artist.country.as_deref(), Some("CA"));
        assert!(artist.tags.is_empty());
    }

    /// Test parsing error response
    #[test]
    fn test_parse_error_response() {
        let json = r#"{
            "error": "Not Found",
            "help": "For usage, please see: https://musicbrainz.org/doc/MusicBrainz_API"
        }"#;

        let error: ApiError = serde_json::from_str(json).expect("Should parse error");
        assert_eq!(error.error, "Not Found");
        assert!(error.help.is_some());
    }
}

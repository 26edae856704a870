//! Deezer API Data Transfer Objects
//!
//! API Reference: https://developers.deezer.com/api
//!
//! Deezer answers errors with status 200 and an `{"error": {...}}` body.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Error { error: ApiError },
    Ok(T),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: String,
    pub code: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub title_short: Option<String>,
    pub link: Option<String>,
    pub preview: Option<String>,
    pub artist: Artist,
    pub album: Option<Album>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub id: u64,
    pub name: String,
    pub link: Option<String>,
    pub picture: Option<String>,
    pub picture_medium: Option<String>,
    pub picture_big: Option<String>,
    pub picture_xl: Option<String>,
    pub nb_fan: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub id: u64,
    pub title: String,
    pub cover_medium: Option<String>,
    pub cover_big: Option<String>,
    pub cover_xl: Option<String>,
}

// ============================================================================
// CONTRACT TESTS
// ============================================================================

#[cfg(test)]
mod contract_tests {
    use super::*;

    #[test]
    fn test_parse_track_search() {
        let json = r#"{
            "data": [{
                "id": 908604612,
                "readable": true,
                "title": "Blinding Lights",
                "title_short": "Blinding Lights",
                "link": "https://www.deezer.com/track/908604612",
                "duration": 200,
                "preview": "https://cdns-preview-d.dzcdn.net/stream/c-d.mp3",
                "artist": {
                    "id": 4050205,
                    "name": "The Weeknd",
                    "picture_xl": "https://e-cdns-images.dzcdn.net/images/artist/033d460f704896c9caca89a1d753a137/1000x1000-000000-80-0-0.jpg",
                    "type": "artist"
                },
                "album": {
                    "id": 139017022,
                    "title": "After Hours",
                    "cover_medium": "https://e-cdns-images.dzcdn.net/images/cover/abc/250x250-000000-80-0-0.jpg",
                    "cover_xl": "https://e-cdns-images.dzcdn.net/images/cover/abc/1000x1000-000000-80-0-0.jpg"
                },
                "type": "track"
            }],
            "total": 1
        }"#;
        let parsed: Envelope<SearchResponse<Track>> = serde_json::from_str(json).expect("parse");
        let Envelope::Ok(response) = parsed else {
            panic!("expected payload");
        };
        assert_eq!(response.data[0].artist.name, "The Weeknd");
        assert!(response.data[0].album.as_ref().unwrap().cover_xl.is_some());
    }

    #[test]
    fn test_parse_error_body() {
        let json = r#"{"error": {"type": "Exception", "message": "Quota limit exceeded", "code": 4}}"#;
        let parsed: Envelope<SearchResponse<Track>> = serde_json::from_str(json).expect("parse");
        match parsed {
            Envelope::Error { error } => assert_eq!(error.code, Some(4)),
            Envelope::Ok(_) => panic!("expected error"),
        }
    }

    #[test]
    fn test_parse_empty_search() {
        let parsed: Envelope<SearchResponse<Artist>> =
            serde_json::from_str(r#"{"data": [], "total": 0}"#).expect("parse");
        assert!(matches!(parsed, Envelope::Ok(r) if r.data.is_empty()));
    }
}

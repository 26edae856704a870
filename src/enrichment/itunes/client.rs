//! iTunes Search API client
//!
//! No authentication. Song search supplies artwork, previews and the Apple
//! Music link; artist pictures come from scraping the artist page.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{adapter, dto, scrape};
use crate::enrichment::domain::{
    ArtistImage, ArtistImageSource, EnrichmentError, LookupResult, TrackQuery,
};
use crate::enrichment::artists::parse_artists;
use crate::enrichment::http::{self, ProviderGuard, ProviderSettings};
use crate::enrichment::matching::dedupe_queries;
use crate::enrichment::merge::MetadataPatch;

const BASE_URL: &str = "https://itunes.apple.com";

/// Apple documents roughly 20 calls per minute; stay polite
pub const MIN_INTERVAL: Duration = Duration::from_millis(300);

const SEARCH_LIMIT: u32 = 10;

/// iTunes Search API client
pub struct ITunesClient {
    http_client: reqwest::Client,
    base_url: String,
    guard: ProviderGuard,
}

impl ITunesClient {
    /// Create a new client
    pub fn new(timeout: Duration) -> Result<Self, EnrichmentError> {
        Self::build(timeout, BASE_URL)
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, EnrichmentError> {
        Self::build(http::DEFAULT_TIMEOUT, base_url)
    }

    fn build(timeout: Duration, base_url: impl Into<String>) -> Result<Self, EnrichmentError> {
        Ok(Self {
            http_client: http::build_client(http::USER_AGENT, timeout)?,
            base_url: base_url.into(),
            guard: ProviderGuard::new(ProviderSettings::new("itunes", MIN_INTERVAL)),
        })
    }

    /// Search for the song: album art, preview URL and Apple Music link.
    pub async fn search_track(&self, query: &TrackQuery) -> LookupResult<MetadataPatch> {
        self.search_track_inner(query).await.into()
    }

    /// Artist search, then song-derived artist, then the artist page scrape.
    pub async fn find_artist_image(&self, artist: &str) -> LookupResult<ArtistImage> {
        self.find_artist_image_inner(artist).await.into()
    }

    async fn search_track_inner(&self, query: &TrackQuery) -> Result<MetadataPatch, EnrichmentError> {
        first_validated_song(query, |term| {
            let url = format!(
                "{}/search?term={}&media=music&entity=song&limit={}",
                self.base_url,
                urlencoding::encode(&term),
                SEARCH_LIMIT
            );
            async move { self.get::<dto::SearchResponse>(&url, "song search").await }
        })
        .await
    }

    async fn find_artist_image_inner(&self, artist: &str) -> Result<ArtistImage, EnrichmentError> {
        let page = match self.artist_page(artist).await? {
            Some(page) => page,
            None => return Err(EnrichmentError::NoMatches),
        };

        for user_agent in [scrape::CRAWLER_USER_AGENT, scrape::BROWSER_USER_AGENT] {
            let html = match self.fetch_page(&page, user_agent).await {
                Ok(html) => html,
                Err(EnrichmentError::NoMatches) => return Err(EnrichmentError::NoMatches),
                Err(e) => {
                    debug!("iTunes artist page fetch failed: {}", e);
                    continue;
                }
            };
            if let Some((url, strategy)) = scrape::extract_artist_image(&html) {
                debug!(
                    "iTunes artist image for '{}' via {}",
                    artist,
                    strategy.as_str()
                );
                return Ok(ArtistImage::new(url, ArtistImageSource::ITunes));
            }
        }
        Err(EnrichmentError::NoMatches)
    }

    /// Resolve the public artist page URL
    async fn artist_page(&self, artist: &str) -> Result<Option<String>, EnrichmentError> {
        let term = urlencoding::encode(artist.trim()).into_owned();

        let url = format!(
            "{}/search?term={}&media=music&entity=musicArtist&limit=5",
            self.base_url, term
        );
        match self.get::<dto::ArtistSearchResponse>(&url, "artist search").await {
            Ok(response) => {
                if let Some(page) = adapter::select_artist_page(artist, &response.results) {
                    return Ok(Some(page));
                }
            }
            Err(EnrichmentError::NoMatches) => {}
            Err(e) => return Err(e),
        }

        debug!("iTunes: deriving artist '{}' from song search", artist);
        let url = format!(
            "{}/search?term={}&media=music&entity=song&attribute=artistTerm&limit={}",
            self.base_url, term, SEARCH_LIMIT
        );
        match self.get::<dto::SearchResponse>(&url, "artist song search").await {
            Ok(response) => Ok(adapter::artist_page_from_songs(artist, &response.results)),
            Err(EnrichmentError::NoMatches) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_page(&self, url: &str, user_agent: &str) -> Result<String, EnrichmentError> {
        self.guard
            .call("artist page", || {
                http::send_text(
                    self.http_client
                        .get(url)
                        .header(reqwest::header::USER_AGENT, user_agent),
                )
            })
            .await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, label: &str) -> Result<T, EnrichmentError> {
        self.guard
            .call(label, || http::send_json::<T>(self.http_client.get(url)))
            .await
    }
}

/// Search terms from most to least precise: primary artist with album,
/// primary artist with title, each featured artist with title, title alone.
pub fn search_strategies(query: &TrackQuery) -> Vec<String> {
    let title = query.clean_title();
    let artists = parse_artists(&query.artist);
    let primary = artists
        .first()
        .cloned()
        .unwrap_or_else(|| query.artist.trim().to_string());

    let mut terms = Vec::new();
    if let Some(album) = &query.album {
        terms.push(format!("{} {}", primary, album.trim()));
    }
    terms.push(format!("{} {}", primary, title));
    terms.extend(artists.iter().skip(1).map(|a| format!("{} {}", a, title)));
    terms.push(title);
    dedupe_queries(terms)
}

/// Run the search strategies in order and stop at the first validated song.
async fn first_validated_song<F, Fut>(
    query: &TrackQuery,
    mut search: F,
) -> Result<MetadataPatch, EnrichmentError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<dto::SearchResponse, EnrichmentError>>,
{
    for term in search_strategies(query) {
        let response = match search(term.clone()).await {
            Ok(response) => response,
            Err(EnrichmentError::NoMatches) => continue,
            Err(e) => return Err(e),
        };
        if let Some(song) = adapter::select_song(query, &response.results) {
            debug!("iTunes matched {:?} via {:?}", song.track_name, term);
            return Ok(adapter::to_patch(song));
        }
        debug!("iTunes: no validated match for {:?}", term);
    }
    Err(EnrichmentError::NoMatches)
}

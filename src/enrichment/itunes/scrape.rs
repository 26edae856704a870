//! Artist image extraction from public Apple Music artist pages.
//!
//! The Search API returns no artist pictures, so the artist page is fetched
//! and searched with [`ExtractStrategy::ORDERED`] until one strategy yields
//! a usable URL.

use std::sync::LazyLock;

use regex::Regex;

/// Social crawlers get server-rendered meta tags
pub const CRAWLER_USER_AGENT: &str =
    "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)";

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";

/// Size substituted into templated or thumbnail image URLs
const IMAGE_SIZE: &str = "600x600bb";

/// Path fragments that identify an artist picture on Apple's CDN
const ARTIST_PATH_MARKERS: &[&str] = &["AMCArtistImages", "/Features", "ArtistImages"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStrategy {
    AmcArtistImages,
    OgImageArtistPath,
    TwitterImageArtistPath,
    JsonLdImage,
    SourceSrcset,
    OgImage,
    AnyMzstatic,
}

impl ExtractStrategy {
    pub const ORDERED: [ExtractStrategy; 7] = [
        ExtractStrategy::AmcArtistImages,
        ExtractStrategy::OgImageArtistPath,
        ExtractStrategy::TwitterImageArtistPath,
        ExtractStrategy::JsonLdImage,
        ExtractStrategy::SourceSrcset,
        ExtractStrategy::OgImage,
        ExtractStrategy::AnyMzstatic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractStrategy::AmcArtistImages => "amc_artist_images",
            ExtractStrategy::OgImageArtistPath => "og_image_artist",
            ExtractStrategy::TwitterImageArtistPath => "twitter_image_artist",
            ExtractStrategy::JsonLdImage => "json_ld_image",
            ExtractStrategy::SourceSrcset => "source_srcset",
            ExtractStrategy::OgImage => "og_image",
            ExtractStrategy::AnyMzstatic => "any_mzstatic",
        }
    }

    fn extract(&self, html: &str) -> Option<String> {
        let p = &*PATTERNS;
        let candidate = match self {
            ExtractStrategy::AmcArtistImages => first_match(&p.amc, html),
            ExtractStrategy::OgImageArtistPath => {
                meta_content(html, "og:image").filter(|u| is_artist_path(u))
            }
            ExtractStrategy::TwitterImageArtistPath => {
                meta_content(html, "twitter:image").filter(|u| is_artist_path(u))
            }
            ExtractStrategy::JsonLdImage => first_match(&p.json_ld_image, html),
            ExtractStrategy::SourceSrcset => first_match(&p.srcset, html),
            ExtractStrategy::OgImage => {
                meta_content(html, "og:image").filter(|u| !is_album_artwork(u))
            }
            ExtractStrategy::AnyMzstatic => p
                .mzstatic
                .find_iter(html)
                .map(|m| m.as_str().to_string())
                .find(|u| !is_album_artwork(u)),
        }?;
        let cleaned = clean_url(&candidate);
        cleaned.starts_with("http").then_some(cleaned)
    }
}

struct Patterns {
    amc: Regex,
    json_ld_image: Regex,
    srcset: Regex,
    mzstatic: Regex,
    meta: Regex,
    attr: Regex,
    album_artwork: Regex,
    size_token: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    amc: Regex::new(r#"https://[a-z0-9.-]*mzstatic\.com/image/thumb/AMCArtistImages[^"'\s,)]+"#)
        .unwrap(),
    json_ld_image: Regex::new(r#""image"\s*:\s*"(https://[^"]+)""#).unwrap(),
    srcset: Regex::new(r#"<source[^>]*srcset="(https://[^"\s,]+)"#).unwrap(),
    mzstatic: Regex::new(r#"https://[a-z0-9.-]*mzstatic\.com/image/thumb/[^"'\s,)]+"#).unwrap(),
    meta: Regex::new(r#"(?i)<meta\s[^>]*>"#).unwrap(),
    attr: Regex::new(r#"([a-zA-Z:_-]+)\s*=\s*"([^"]*)""#).unwrap(),
    album_artwork: Regex::new(r#"/image/thumb/(?:Music\d*|Video\d*)/"#).unwrap(),
    size_token: Regex::new(r#"(?:\{w\}x\{h\}(?:\{c\}|[a-z]{0,2})|\d+x\d+[a-z]{0,2})\.(?:\{f\}|jpg|jpeg|png|webp)$"#)
        .unwrap(),
});

fn first_match(re: &Regex, html: &str) -> Option<String> {
    let caps = re.captures(html)?;
    caps.get(1)
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().to_string())
}

/// `content` of the first `<meta property|name="...">` tag with the given key
fn meta_content(html: &str, key: &str) -> Option<String> {
    let p = &*PATTERNS;
    p.meta.find_iter(html).find_map(|tag| {
        let mut is_key = false;
        let mut content = None;
        for caps in p.attr.captures_iter(tag.as_str()) {
            match caps[1].to_ascii_lowercase().as_str() {
                "property" | "name" if caps[2].eq_ignore_ascii_case(key) => is_key = true,
                "content" => content = Some(caps[2].to_string()),
                _ => {}
            }
        }
        if is_key { content } else { None }
    })
}

fn is_artist_path(url: &str) -> bool {
    ARTIST_PATH_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Album covers live under `Music*/` on the CDN; artist pages use them as
/// a fallback social image.
pub fn is_album_artwork(url: &str) -> bool {
    !is_artist_path(url) && PATTERNS.album_artwork.is_match(url)
}

/// Unescape HTML entities and pin the image size.
fn clean_url(raw: &str) -> String {
    let url = raw.trim().replace("&amp;", "&").replace("\\u002F", "/");
    PATTERNS
        .size_token
        .replace(&url, format!("{}.jpg", IMAGE_SIZE))
        .into_owned()
}

/// Run the strategies in order; the first hit wins.
pub fn extract_artist_image(html: &str) -> Option<(String, ExtractStrategy)> {
    ExtractStrategy::ORDERED
        .iter()
        .find_map(|strategy| strategy.extract(html).map(|url| (url, *strategy)))
}

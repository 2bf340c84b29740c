// src/fetch/mod.rs
// =============================================================================
// The boundary between the crawl and the network.
//
// The crawl only needs "GET this URL, follow redirects, tell me where you
// ended up and what came back". Keeping that behind a trait lets the crawl
// tests run against an in-memory site instead of the internet.
//
// Submodules:
// - http: the reqwest-backed implementation used by the binary
// =============================================================================

mod http;

pub use http::HttpFetcher;

use crate::error::CloneError;
use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::HeaderMap;
use url::Url;

/// The outcome of one GET, after redirects were followed.
#[derive(Debug, Clone)]
pub struct PageResult {
    /// Where the request ended up; relative links resolve against this
    pub final_url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl PageResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    // The media type without parameters, lowercased ("text/html; charset=utf-8" -> "text/html")
    pub fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
        })
    }

    // The charset parameter of the content type, if present
    pub fn charset(&self) -> Option<&str> {
        self.content_type.as_deref()?.split(';').skip(1).find_map(|param| {
            let (name, value) = param.split_once('=')?;
            if name.trim().eq_ignore_ascii_case("charset") {
                Some(value.trim().trim_matches('"'))
            } else {
                None
            }
        })
    }

    // Text encoding of the body: the declared charset, UTF-8 when absent or unknown
    pub fn encoding(&self) -> &'static Encoding {
        self.charset()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    // Returns Ok for any HTTP status; Err only when no response was received
    async fn fetch(&self, url: &Url) -> Result<PageResult, CloneError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(content_type: Option<&str>) -> PageResult {
        PageResult {
            final_url: Url::parse("http://example.com/").unwrap(),
            status: 200,
            content_type: content_type.map(str::to_string),
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    #[test]
    fn test_media_type_and_charset() {
        let latin = page(Some("Text/HTML; Charset=\"ISO-8859-1\""));
        assert_eq!(latin.media_type().as_deref(), Some("text/html"));
        assert_eq!(latin.charset(), Some("ISO-8859-1"));
        assert_eq!(latin.encoding(), encoding_rs::WINDOWS_1252);

        assert_eq!(page(Some("text/css")).encoding(), UTF_8);
        assert_eq!(page(Some("text/html; charset=bogus")).encoding(), UTF_8);
        assert_eq!(page(None).charset(), None);
    }
}

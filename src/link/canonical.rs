// src/link/canonical.rs
// =============================================================================
// URL canonicalization.
//
// Every reference we meet (seed, anchor, stylesheet, image, redirect target)
// is reduced to a CanonicalUrl before we decide anything about it. The
// canonical form is what the crawl uses to answer "have we seen this?" and
// "where does it live on disk?".
//
// Normalization rules:
// - relative references are resolved against the page they appear on
// - a missing scheme defaults to http
// - query string and fragment are dropped
// - empty path becomes "/", trailing slashes are stripped (except for "/")
//
// Rust concepts:
// - Manual PartialEq/Hash: identity ignores the scheme
// - Display: the canonical text form round-trips through canonicalize()
// =============================================================================

use crate::error::CloneError;
use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

/// A normalized `(scheme, host, path)` crawl identity.
///
/// Two canonical URLs are equal when host and path are equal. The scheme is
/// kept so the page can be fetched again, but `http://h/a` and `https://h/a`
/// are the same crawl unit because they land on the same local file.
#[derive(Debug, Clone)]
pub struct CanonicalUrl {
    scheme: String,
    host: String,
    path: String,
}

impl CanonicalUrl {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host name, with `:port` appended when the port is not the scheme default.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    // The URL to hand to the fetcher
    pub fn to_url(&self) -> Result<Url, CloneError> {
        Url::parse(&self.to_string()).map_err(|_| CloneError::UnresolvableUrl(self.to_string()))
    }
}

impl PartialEq for CanonicalUrl {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.path == other.path
    }
}

impl Eq for CanonicalUrl {}

impl Hash for CanonicalUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.path.hash(state);
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)
    }
}

// Resolves `raw` against `base` and normalizes the result
//
// Parameters:
//   raw: the reference as written (absolute, scheme-relative or relative)
//   base: the URL of the page the reference was found on
//
// Returns: the canonical URL, or UnresolvableUrl for mailto:, javascript:,
// data:, ftp: and anything else that does not name an http(s) host
pub fn canonicalize(raw: &str, base: &Url) -> Result<CanonicalUrl, CloneError> {
    let resolved = resolve(raw, base)?;
    from_url(&resolved)
}

// Resolves a reference to an absolute URL, keeping query and fragment
//
// Used where the full URL is needed, e.g. anchors on a no-follow page that
// must point back out to the live web.
pub fn resolve(raw: &str, base: &Url) -> Result<Url, CloneError> {
    base.join(raw.trim())
        .map_err(|_| CloneError::UnresolvableUrl(raw.to_string()))
}

// Canonicalizes a seed given on the command line
//
// Users type "example.com" or "//example.com/docs" as often as a full URL,
// so a missing scheme is filled in with http before parsing.
pub fn canonicalize_seed(raw: &str) -> Result<CanonicalUrl, CloneError> {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.starts_with("//") {
        format!("http:{}", trimmed)
    } else if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&with_scheme).map_err(|_| CloneError::UnresolvableUrl(raw.to_string()))?;
    from_url(&url)
}

// Builds the canonical form of an already-absolute URL
pub fn from_url(url: &Url) -> Result<CanonicalUrl, CloneError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(CloneError::UnresolvableUrl(url.to_string()));
    }

    let host_name = match url.host_str() {
        Some(h) if !h.is_empty() => h,
        _ => return Err(CloneError::UnresolvableUrl(url.to_string())),
    };

    // url::Url::port() is None when the port is the scheme default
    let host = match url.port() {
        Some(port) => format!("{}:{}", host_name, port),
        None => host_name.to_string(),
    };

    Ok(CanonicalUrl {
        scheme: url.scheme().to_string(),
        host,
        path: normalize_path(url.path()),
    })
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

// src/error.rs
// =============================================================================
// Error kinds produced while cloning a site.
//
// None of these abort a crawl. The page processor and the link rewriter
// catch them, log them with the URL involved and skip the unit of work
// (one page or one reference).
// =============================================================================

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Why a fetch failed before any HTTP status was available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Request timed out
    Timeout,
    /// Too many redirects (redirect loop)
    TooManyRedirects,
    /// Could not resolve hostname
    Dns,
    /// Connection refused or reset
    Connect,
    /// SSL/TLS certificate error
    Tls,
    /// The response started but the body could not be read
    Body,
    /// Other error
    Other,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransportKind::Timeout => "timeout",
            TransportKind::TooManyRedirects => "too many redirects",
            TransportKind::Dns => "dns error",
            TransportKind::Connect => "connection failed",
            TransportKind::Tls => "tls error",
            TransportKind::Body => "body read failed",
            TransportKind::Other => "transport error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum CloneError {
    #[error("{kind} while fetching {url}: {reason}")]
    Transport {
        url: String,
        kind: TransportKind,
        reason: String,
    },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("no resolvable http(s) host in '{0}'")]
    UnresolvableUrl(String),

    #[error("could not parse {what} from {url}: {reason}")]
    Parse {
        url: String,
        what: &'static str,
        reason: String,
    },

    #[error("could not write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CloneError {
    // Short machine-friendly label used in the JSON report
    pub fn kind(&self) -> &'static str {
        match self {
            CloneError::Transport { .. } => "transport",
            CloneError::Http { .. } => "http",
            CloneError::UnresolvableUrl(_) => "unresolvable_url",
            CloneError::Parse { .. } => "parse",
            CloneError::Io { .. } => "io",
        }
    }
}

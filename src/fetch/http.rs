// src/fetch/http.rs
// =============================================================================
// Fetches pages over HTTP with reqwest.
//
// Key functionality:
// - One pooled client for the whole run (connection reuse per host)
// - Redirects are followed transparently; the final URL is reported back
// - A per-request timeout; a timeout is just another transport failure
// - Transport failures are sorted into kinds (timeout, dns, tls, ...) so the
//   log and the report say why a page was skipped
// =============================================================================

use super::{Fetcher, PageResult};
use crate::error::{CloneError, TransportKind};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

const MAX_REDIRECTS: usize = 10;

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    // Builds the shared client
    //
    // Parameters:
    //   timeout: upper bound for one request, including the body download
    //   user_agent: sent with every request
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageResult, CloneError> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| categorize_error(url, e))?;

        let final_url = response.url().clone();
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await.map_err(|e| CloneError::Transport {
            url: url.to_string(),
            kind: TransportKind::Body,
            reason: e.to_string(),
        })?;

        Ok(PageResult {
            final_url,
            status,
            content_type,
            headers,
            body: body.to_vec(),
        })
    }
}

// Sorts a reqwest error into a transport kind
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - SSL certificate issues
// - Too many redirects
fn categorize_error(url: &Url, error: reqwest::Error) -> CloneError {
    let error_string = error.to_string().to_ascii_lowercase();

    let kind = if error.is_timeout() {
        TransportKind::Timeout
    } else if error.is_redirect() {
        TransportKind::TooManyRedirects
    } else if error.is_connect() {
        // Connection errors often mean DNS issues or host unreachable
        if error_string.contains("dns") {
            TransportKind::Dns
        } else {
            TransportKind::Connect
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        TransportKind::Tls
    } else {
        TransportKind::Other
    };

    CloneError::Transport {
        url: url.to_string(),
        kind,
        reason: error.to_string(),
    }
}

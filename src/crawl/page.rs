// src/crawl/page.rs
// =============================================================================
// Processes one frontier entry: fetch -> rewrite -> write.
//
// Steps:
// 1. Skip if the mirrored file already exists (from this run or a previous one)
// 2. Fetch; a transport failure or non-2xx status skips the page
// 3. Re-canonicalize with the final URL after redirects; links resolve
//    against where we ended up, not where we started. A page that
//    redirected off the root host is treated as no-follow
// 4. Rewrite by content type:
//    text/html           -> rewrite_html
//    text/css            -> rewrite_css (only with static assets enabled)
//    anything else       -> raw bytes, untouched
// 5. Create the directory and write the file (truncating)
// 6. Hand the discovered URLs back to the frontier
//
// The processor keeps no state between pages.
// =============================================================================

use crate::error::CloneError;
use crate::fetch::{Fetcher, PageResult};
use crate::link::{self, to_local_path, CanonicalUrl, LocalPath};
use crate::rewrite::{rewrite_css, rewrite_html, RewriteContext, RewritePolicy};
use super::FrontierEntry;
use encoding_rs::Encoding;
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, info, warn};

/// A page ready to be written.
#[derive(Debug)]
pub struct RenderedPage {
    pub final_url: CanonicalUrl,
    pub local_path: LocalPath,
    pub content: Vec<u8>,
    pub discovered: Vec<FrontierEntry>,
}

/// What happened to one entry.
#[derive(Debug)]
pub enum PageOutcome {
    Written {
        final_url: CanonicalUrl,
        local_path: LocalPath,
        bytes: usize,
        discovered: Vec<FrontierEntry>,
    },
    /// The mirrored file was already on disk; nothing was fetched or followed
    AlreadyPresent { local_path: LocalPath },
    Failed { error: CloneError },
}

pub struct PageProcessor<'a> {
    fetcher: &'a dyn Fetcher,
    policy: &'a RewritePolicy,
}

impl<'a> PageProcessor<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, policy: &'a RewritePolicy) -> Self {
        PageProcessor { fetcher, policy }
    }

    // `root_host` is None for the seed: wherever it lands becomes the site
    pub async fn process(&self, entry: &FrontierEntry, root_host: Option<&str>) -> PageOutcome {
        let local_path = to_local_path(&entry.url, &self.policy.root_dir);
        if file_exists(&local_path.file_path()).await {
            info!(path = %local_path.file_path().display(), "hit for existing local page");
            return PageOutcome::AlreadyPresent { local_path };
        }

        let page = match self.fetch(entry).await {
            Ok(page) => page,
            Err(error) => {
                warn!(url = %entry.url, error = %error, "skipping page");
                return PageOutcome::Failed { error };
            }
        };

        let rendered = match render(entry, page, self.policy, root_host) {
            Ok(rendered) => rendered,
            Err(error) => {
                warn!(url = %entry.url, error = %error, "skipping page");
                return PageOutcome::Failed { error };
            }
        };

        // A redirect may land on a page we already mirrored
        if rendered.local_path != local_path && file_exists(&rendered.local_path.file_path()).await {
            info!(
                url = %entry.url,
                final_url = %rendered.final_url,
                "redirect target already on disk"
            );
            return PageOutcome::AlreadyPresent {
                local_path: rendered.local_path,
            };
        }

        match write_page(&rendered).await {
            Ok(bytes) => {
                info!(
                    url = %rendered.final_url,
                    path = %rendered.local_path.file_path().display(),
                    bytes,
                    discovered = rendered.discovered.len(),
                    "saved page"
                );
                PageOutcome::Written {
                    final_url: rendered.final_url,
                    local_path: rendered.local_path,
                    bytes,
                    discovered: rendered.discovered,
                }
            }
            Err(error) => {
                warn!(url = %rendered.final_url, error = %error, "skipping page");
                PageOutcome::Failed { error }
            }
        }
    }

    async fn fetch(&self, entry: &FrontierEntry) -> Result<PageResult, CloneError> {
        let url = entry.url.to_url()?;
        info!(url = %url, no_follow = entry.no_follow, "downloading page");
        let page = self.fetcher.fetch(&url).await?;
        if !page.is_success() {
            return Err(CloneError::Http {
                url: url.to_string(),
                status: page.status,
            });
        }
        Ok(page)
    }
}

// Turns a fetched page into the bytes to write, where to write them, and
// the URLs it references
//
// Pure apart from logging: no I/O happens here.
pub fn render(
    entry: &FrontierEntry,
    page: PageResult,
    policy: &RewritePolicy,
    root_host: Option<&str>,
) -> Result<RenderedPage, CloneError> {
    let final_url = link::from_url(&page.final_url)?;
    if final_url != entry.url {
        debug!(requested = %entry.url, final_url = %final_url, "followed redirect");
    }

    let root_host = root_host.unwrap_or(final_url.host());
    let off_site = final_url.host() != root_host;
    if off_site && !entry.no_follow {
        info!(url = %entry.url, final_url = %final_url, "redirected off site, not following");
    }

    let ctx = RewriteContext::new(
        page.final_url.clone(),
        final_url.clone(),
        entry.no_follow || off_site,
        root_host,
        policy,
    );
    let media_type = page.media_type().unwrap_or_default();

    let (content, discovered) = match media_type.as_str() {
        "text/html" | "application/xhtml+xml" => {
            let (markup, encoding) = decode(&page);
            let (html, discovered) = rewrite_html(&markup, &ctx, policy);
            (encode(&html, encoding), discovered)
        }
        "text/css" if policy.fetch_static => {
            let (source, encoding) = decode(&page);
            let (css, discovered) = rewrite_css(&source, &ctx, policy)?;
            (encode(&css, encoding), discovered)
        }
        _ => (page.body, Vec::new()),
    };

    Ok(RenderedPage {
        final_url,
        local_path: ctx.local_path,
        content,
        discovered,
    })
}

// Decodes the body with its declared charset; a byte order mark wins
fn decode(page: &PageResult) -> (Cow<'_, str>, &'static Encoding) {
    let (text, encoding, had_errors) = page.encoding().decode(&page.body);
    if had_errors {
        debug!(url = %page.final_url, encoding = encoding.name(), "malformed bytes in body");
    }
    (text, encoding)
}

// Writes the page back in the encoding it was served in, so its own
// <meta charset> or @charset stays true
fn encode(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    let (bytes, _, _) = encoding.encode(text);
    bytes.into_owned()
}

async fn write_page(page: &RenderedPage) -> Result<usize, CloneError> {
    let directory = &page.local_path.directory;
    tokio::fs::create_dir_all(directory)
        .await
        .map_err(|source| CloneError::Io {
            path: directory.clone(),
            source,
        })?;

    let path = page.local_path.file_path();
    tokio::fs::write(&path, &page.content)
        .await
        .map_err(|source| CloneError::Io { path, source })?;
    Ok(page.content.len())
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

// src/crawl/mod.rs
// =============================================================================
// This module mirrors one website.
//
// Features:
// - Breadth-first crawling starting from a seed URL
// - In-domain pages are followed; external pages (when enabled) are mirrored
//   but their anchors are not crawled
// - A bounded pool of concurrent fetches
// - Pages already on disk are skipped, so a rerun fetches nothing new
//
// Submodules:
// - frontier: the FIFO queue + visited set
// - page: fetch/rewrite/write for one entry
// =============================================================================

mod frontier;
mod page;

pub use frontier::{Frontier, FrontierEntry, FrontierState};
pub use page::{render, PageOutcome, PageProcessor, RenderedPage};

use crate::error::CloneError;
use crate::fetch::Fetcher;
use crate::link::CanonicalUrl;
use crate::rewrite::RewritePolicy;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

/// Settings for a whole run, lowered from the command line.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub policy: RewritePolicy,
    /// Upper bound on pages fetched at the same time
    pub concurrency: usize,
}

/// A page that could not be mirrored.
#[derive(Debug, Clone, Serialize)]
pub struct PageFailure {
    pub url: String,
    pub kind: &'static str,
    pub message: String,
}

/// Summary of one site's crawl.
#[derive(Debug, Clone, Serialize)]
pub struct SiteReport {
    pub seed: String,
    pub root_host: String,
    pub pages_written: usize,
    pub pages_present: usize,
    pub bytes_written: usize,
    pub failures: Vec<PageFailure>,
    /// The seed itself could not be mirrored and nothing was written
    pub seed_failed: bool,
}

impl SiteReport {
    fn new(seed: &CanonicalUrl) -> Self {
        SiteReport {
            seed: seed.to_string(),
            root_host: seed.host().to_string(),
            pages_written: 0,
            pages_present: 0,
            bytes_written: 0,
            failures: Vec::new(),
            seed_failed: false,
        }
    }

    fn record_failure(&mut self, url: &CanonicalUrl, error: &CloneError) {
        self.failures.push(PageFailure {
            url: url.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        });
    }
}

// Crawls one site until its frontier is drained
//
// Parameters:
//   seed: canonical seed URL; its host is the root host
//   fetcher: network boundary
//   options: crawl-wide settings
//
// Returns: the site report. Page failures are recorded, never raised.
pub async fn clone_site(
    seed: CanonicalUrl,
    fetcher: &dyn Fetcher,
    options: &CrawlOptions,
) -> SiteReport {
    let mut report = SiteReport::new(&seed);
    let mut frontier = Frontier::new();
    frontier.enqueue_seed(seed.clone());

    let processor = PageProcessor::new(fetcher, &options.policy);
    let concurrency = options.concurrency.max(1);

    info!(seed = %seed, "cloning website");

    while frontier.state() == FrontierState::Running {
        let batch = frontier.next_batch(concurrency);
        let root_host = frontier.root_host().to_string();

        // buffered() keeps results in queue order, so discovery order
        // (and therefore the BFS order) does not depend on network timing
        let outcomes: Vec<(FrontierEntry, PageOutcome)> = stream::iter(batch)
            .map(|entry| {
                let span = info_span!("page", url = %entry.url, no_follow = entry.no_follow);
                let processor = &processor;
                let root = (entry.url != seed).then_some(root_host.as_str());
                async move {
                    let outcome = processor.process(&entry, root).await;
                    (entry, outcome)
                }
                .instrument(span)
            })
            .buffered(concurrency)
            .collect()
            .await;

        for (entry, outcome) in outcomes {
            let is_seed = entry.url == seed;
            match outcome {
                PageOutcome::Written {
                    final_url,
                    bytes,
                    discovered,
                    ..
                } => {
                    report.pages_written += 1;
                    report.bytes_written += bytes;

                    if is_seed && final_url.host() != frontier.root_host() {
                        info!(from = %seed, to = %final_url, "seed redirected to another host");
                        frontier.rebase_root(final_url.host());
                        report.root_host = final_url.host().to_string();
                    }
                    frontier.mark_visited(final_url);

                    for found in discovered {
                        frontier.offer(found);
                    }
                }
                PageOutcome::AlreadyPresent { .. } => report.pages_present += 1,
                PageOutcome::Failed { error } => {
                    if is_seed {
                        report.seed_failed = true;
                    }
                    report.record_failure(&entry.url, &error);
                }
            }
        }
    }

    if report.seed_failed {
        warn!(seed = %seed, "nothing was mirrored for this site");
    }
    info!(
        seed = %seed,
        written = report.pages_written,
        present = report.pages_present,
        failed = report.failures.len(),
        visited = frontier.visited_count(),
        "finished website"
    );

    report
}


#[cfg(test)]
mod tests {
    use super::test_support::StubFetcher;
    use super::*;
    use crate::link::{canonicalize_seed, LinkStyle};
    use std::path::Path;
    use tempfile::TempDir;

    fn options(root: &Path, follow_external: bool, fetch_static: bool) -> CrawlOptions {
        CrawlOptions {
            policy: RewritePolicy {
                root_dir: root.to_path_buf(),
                follow_external,
                fetch_static,
                link_style: LinkStyle::Absolute,
            },
            concurrency: 3,
        }
    }

    fn site() -> StubFetcher {
        StubFetcher::new()
            .page(
                "http://example.com/",
                "text/html",
                r#"<html><head><link rel="stylesheet" href="/style.css"></head>
                   <body><a href="/about">About</a> <a href="http://other.com/x">Other</a></body></html>"#,
            )
            .page(
                "http://example.com/about",
                "text/html",
                r#"<a href="/">Home</a><a href="/about/">Self</a>"#,
            )
            .page("http://example.com/style.css", "text/css", "body { background: url(/bg.png) }")
            .page("http://example.com/bg.png", "image/png", "PNG")
            .page(
                "http://other.com/x",
                "text/html",
                r#"<a href="/y">Y</a><script src="/lib.js"></script>"#,
            )
            .page("http://other.com/y", "text/html", "never crawled")
            .page("http://other.com/lib.js", "application/javascript", "var x;")
    }

    #[tokio::test]
    async fn test_in_domain_crawl_without_static_or_external() {
        let dir = TempDir::new().unwrap();
        let fetcher = site();
        let seed = canonicalize_seed("example.com").unwrap();

        let report = clone_site(seed, &fetcher, &options(dir.path(), false, false)).await;

        let mut fetched = fetcher.fetched();
        fetched.sort();
        assert_eq!(fetched, vec!["http://example.com/", "http://example.com/about"]);
        assert_eq!(report.pages_written, 2);
        assert!(report.failures.is_empty());

        let index = std::fs::read_to_string(dir.path().join("example.com/index.html")).unwrap();
        let about_path = dir.path().join("example.com/about");
        assert!(index.contains(&format!("href=\"{}\"", about_path.display())));
        // external link stays pointing at the live site
        assert!(index.contains(r#"href="http://other.com/x""#));
        assert!(index.contains(r#"href="/style.css""#));
        assert!(about_path.is_file());
        assert!(!dir.path().join("other.com").exists());
    }

    #[tokio::test]
    async fn test_static_assets_are_mirrored() {
        let dir = TempDir::new().unwrap();
        let fetcher = site();
        let seed = canonicalize_seed("http://example.com/").unwrap();

        let report = clone_site(seed, &fetcher, &options(dir.path(), false, true)).await;

        assert_eq!(report.pages_written, 4);
        let css = std::fs::read_to_string(dir.path().join("example.com/style.css")).unwrap();
        let bg = dir.path().join("example.com/bg.png");
        assert!(css.contains(&format!("url({})", bg.display())));
        assert_eq!(std::fs::read(&bg).unwrap(), b"PNG");
    }

    #[tokio::test]
    async fn test_no_follow_containment() {
        let dir = TempDir::new().unwrap();
        let fetcher = site();
        let seed = canonicalize_seed("http://example.com/").unwrap();

        clone_site(seed, &fetcher, &options(dir.path(), true, false)).await;

        let fetched = fetcher.fetched();
        assert!(fetched.contains(&"http://other.com/x".to_string()));
        // the script makes the external page render, its anchor is not crawled
        assert!(fetched.contains(&"http://other.com/lib.js".to_string()));
        assert!(!fetched.contains(&"http://other.com/y".to_string()));

        let external = std::fs::read_to_string(dir.path().join("other.com/x")).unwrap();
        assert!(external.contains(r#"href="http://other.com/y""#));
    }

    #[tokio::test]
    async fn test_each_url_is_fetched_once() {
        let dir = TempDir::new().unwrap();
        let fetcher = site();
        let seed = canonicalize_seed("http://example.com/").unwrap();

        clone_site(seed, &fetcher, &options(dir.path(), true, true)).await;

        let fetched = fetcher.fetched();
        let mut unique = fetched.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(fetched.len(), unique.len());
    }

    #[tokio::test]
    async fn test_rerun_performs_no_fetches() {
        let dir = TempDir::new().unwrap();
        let seed = canonicalize_seed("http://example.com/").unwrap();

        let first = site();
        clone_site(seed.clone(), &first, &options(dir.path(), false, true)).await;
        assert!(first.fetch_count() > 0);

        let second = site();
        let report = clone_site(seed, &second, &options(dir.path(), false, true)).await;
        assert_eq!(second.fetch_count(), 0);
        assert_eq!(report.pages_present, 1);
        assert!(!report.seed_failed);
    }

    #[tokio::test]
    async fn test_unreachable_seed_is_reported() {
        let dir = TempDir::new().unwrap();
        let fetcher = StubFetcher::new();
        let seed = canonicalize_seed("http://down.example/").unwrap();

        let report = clone_site(seed, &fetcher, &options(dir.path(), false, false)).await;
        assert!(report.seed_failed);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, "http");
    }

    #[tokio::test]
    async fn test_seed_redirect_moves_root_host() {
        let dir = TempDir::new().unwrap();
        let fetcher = StubFetcher::new()
            .redirect("http://example.com/", "http://www.example.com/")
            .page("http://www.example.com/", "text/html", r#"<a href="/docs">Docs</a>"#)
            .page("http://www.example.com/docs", "text/html", r#"<a href="/deep">Deep</a>"#)
            .page("http://www.example.com/deep", "text/html", "bottom");
        let seed = canonicalize_seed("example.com").unwrap();

        let report = clone_site(seed, &fetcher, &options(dir.path(), false, false)).await;

        assert_eq!(report.root_host, "www.example.com");
        assert_eq!(report.pages_written, 3);
        // /docs was crawled as an in-domain page, so its anchor was followed
        assert!(dir.path().join("www.example.com/deep").is_file());
    }

    #[tokio::test]
    async fn test_page_redirecting_off_site_is_contained() {
        let dir = TempDir::new().unwrap();
        let fetcher = StubFetcher::new()
            .page("http://example.com/", "text/html", r#"<a href="/moved">Moved</a>"#)
            .redirect("http://example.com/moved", "http://other.com/landing")
            .page("http://other.com/landing", "text/html", r#"<a href="/next">Next</a>"#)
            .page("http://other.com/next", "text/html", "off site");
        let seed = canonicalize_seed("http://example.com/").unwrap();

        let report = clone_site(seed, &fetcher, &options(dir.path(), false, false)).await;

        assert_eq!(
            fetcher.fetched(),
            vec!["http://example.com/", "http://example.com/moved"]
        );
        assert_eq!(report.root_host, "example.com");
        assert!(dir.path().join("other.com/landing").is_file());
    }

    #[tokio::test]
    async fn test_file_in_place_of_directory_is_skipped() {
        let dir = TempDir::new().unwrap();
        let fetcher = StubFetcher::new()
            .page(
                "http://example.com/",
                "text/html",
                r#"<a href="/a">A</a><a href="/c">C</a>"#,
            )
            .page("http://example.com/a", "text/html", r#"<a href="/a/b">B</a>"#)
            .page("http://example.com/a/b", "text/html", r#"<a href="/d">D</a>"#)
            .page("http://example.com/c", "text/html", r#"<a href="/e">E</a>"#)
            .page("http://example.com/e", "text/html", "last");
        let seed = canonicalize_seed("http://example.com/").unwrap();

        let report = clone_site(seed, &fetcher, &options(dir.path(), false, false)).await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].url, "http://example.com/a/b");
        assert_eq!(report.failures[0].kind, "io");
        assert!(!report.seed_failed);
        // /a stays a file and the crawl carried on past the failure
        assert!(dir.path().join("example.com/a").is_file());
        assert!(dir.path().join("example.com/e").is_file());
        assert_eq!(report.pages_written, 4);
        // anchors of the failed page were never discovered
        assert!(!fetcher.fetched().contains(&"http://example.com/d".to_string()));
    }
}

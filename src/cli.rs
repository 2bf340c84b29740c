// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// The flags mirror what a cloning job needs: which sites, where to put
// them, and how far beyond the site's own pages to go.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "site-cloner",
    version = "0.1.0",
    about = "Mirror websites to local storage for offline browsing",
    long_about = "site-cloner crawls each website breadth-first, rewrites links in HTML and CSS \
                  so the copy is browsable offline, and stores every page under \
                  <directory>/<host>/<path>. Pages already on disk are not downloaded again."
)]
pub struct Cli {
    /// List of websites which need to be cloned
    ///
    /// Example: -w example.com https://docs.example.org/guide
    #[arg(short = 'w', long = "website-urls", required = true, num_args = 1..)]
    pub website_urls: Vec<String>,

    /// Directory in which the websites should be cloned (default: current directory)
    #[arg(short = 'd', long)]
    pub directory: Option<PathBuf>,

    /// Fetch pages which are not in the domain of the website being cloned
    #[arg(short = 'e', long = "external-url")]
    pub external_url: bool,

    /// Download resources referenced in CSS files and image tags
    #[arg(short = 's', long = "fetch-static")]
    pub fetch_static: bool,

    /// Rewrite links relative to the referring file instead of as absolute paths
    #[arg(long)]
    pub relative_links: bool,

    /// Number of pages fetched at the same time
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// User-Agent header sent with every request
    #[arg(long, env = "SITE_CLONER_USER_AGENT", default_value = concat!("site-cloner/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,

    /// Print the crawl report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Show debug logs (RUST_LOG takes precedence when set)
    #[arg(short, long)]
    pub verbose: bool,
}

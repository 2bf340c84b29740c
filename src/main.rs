// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Build the log subscriber and attach it to the run
// 3. Clone each website in turn (one site is finished before the next starts)
// 4. Print a summary (or JSON report)
// 5. Exit with proper code (0 = done, 1 = a seed could not be fetched, 2 = error)
// =============================================================================

// The crawl engine lives in the library (src/lib.rs); only the CLI is here
mod cli;       // src/cli.rs - command-line parsing

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use site_cloner::crawl::{self, CrawlOptions, SiteReport};
use site_cloner::error::CloneError;
use site_cloner::fetch::HttpFetcher;
use site_cloner::link::{self, LinkStyle};
use site_cloner::logging;
use site_cloner::rewrite::RewritePolicy;
use std::path::PathBuf;
use std::time::Duration;
use tracing::instrument::WithSubscriber;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let dispatch = logging::build_dispatch(cli.verbose);

    let exit_code = match run(cli).with_subscriber(dispatch).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every site was processed
//   Ok(1) = at least one seed produced no output
//   Err = setup failed before any crawling
async fn run(cli: Cli) -> Result<i32> {
    let root_dir = resolve_root_dir(cli.directory.as_ref())?;
    let options = CrawlOptions {
        policy: RewritePolicy {
            root_dir,
            follow_external: cli.external_url,
            fetch_static: cli.fetch_static,
            link_style: if cli.relative_links {
                LinkStyle::Relative
            } else {
                LinkStyle::Absolute
            },
        },
        concurrency: usize::from(cli.concurrency),
    };
    let fetcher = HttpFetcher::new(Duration::from_secs(cli.timeout), &cli.user_agent)
        .context("could not build HTTP client")?;

    info!(root = %options.policy.root_dir.display(), "starting clone job");

    let mut reports = Vec::new();
    for website in &cli.website_urls {
        let seed = match link::canonicalize_seed(website) {
            Ok(seed) => seed,
            Err(e) => {
                error!(website = %website, error = %e, "skipping website");
                reports.push(unusable_seed(website, &e));
                continue;
            }
        };
        reports.push(crawl::clone_site(seed, &fetcher, &options).await);
    }

    info!("ending clone job");

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_summary(&reports);
    }

    if reports.iter().any(|r| r.seed_failed) {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Output root: the given directory (relative to cwd), or cwd itself
fn resolve_root_dir(directory: Option<&PathBuf>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("could not read current directory")?;
    Ok(match directory {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => cwd.join(dir),
        None => cwd,
    })
}

fn unusable_seed(website: &str, e: &CloneError) -> SiteReport {
    SiteReport {
        seed: website.to_string(),
        root_host: String::new(),
        pages_written: 0,
        pages_present: 0,
        bytes_written: 0,
        failures: vec![crawl::PageFailure {
            url: website.to_string(),
            kind: e.kind(),
            message: e.to_string(),
        }],
        seed_failed: true,
    }
}

fn print_summary(reports: &[SiteReport]) {
    for report in reports {
        println!();
        if report.seed_failed {
            println!("❌ {} could not be cloned", report.seed);
        } else {
            println!("🌐 {} ({})", report.seed, report.root_host);
        }
        println!("   ✅ Saved: {} page(s), {} bytes", report.pages_written, report.bytes_written);
        println!("   📁 Already on disk: {}", report.pages_present);
        println!("   ⚠️  Skipped: {}", report.failures.len());

        for failure in &report.failures {
            println!("      {:<60} {}", truncate(&failure.url, 57), failure.message);
        }
    }
}

// Truncate URL if too long for display
fn truncate(url: &str, max: usize) -> String {
    if url.chars().count() > max {
        let head: String = url.chars().take(max).collect();
        format!("{}...", head)
    } else {
        url.to_string()
    }
}

// src/logging.rs
// =============================================================================
// Builds the log subscriber.
//
// The subscriber is created once in main and attached to the crawl future
// (WithSubscriber) rather than installed as the global default, so every
// component logs through the one handed down to it.
//
// Logs go to stderr; stdout is reserved for the summary or JSON report.
// =============================================================================

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

// Creates the dispatcher for this run
//
// Parameters:
//   verbose: debug level for our own crate instead of info
//
// RUST_LOG, when set, replaces the default filter entirely.
pub fn build_dispatch(verbose: bool) -> Dispatch {
    let default_filter = if verbose {
        "site_cloner=debug,warn"
    } else {
        "site_cloner=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    Dispatch::new(subscriber)
}

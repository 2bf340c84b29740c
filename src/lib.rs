// src/lib.rs
// =============================================================================
// site-cloner: mirror a website to local storage.
//
// Modules, leaves first:
// - link: URL canonicalization and the URL -> local file mapping
// - rewrite: HTML and CSS link rewriting
// - fetch: the HTTP boundary
// - crawl: the frontier, the page processor and the per-site loop
// - error: error kinds shared by all of the above
// - logging: the tracing subscriber handed to a run
// =============================================================================

pub mod crawl;
pub mod error;
pub mod fetch;
pub mod link;
pub mod logging;
pub mod rewrite;

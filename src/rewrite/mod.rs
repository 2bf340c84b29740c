// src/rewrite/mod.rs
// =============================================================================
// Link rewriting shared by the HTML and CSS passes.
//
// Every outbound reference goes through decide():
// - anchor on a no-follow page -> absolute live URL, never queued
// - no http(s) host after resolving against the page URL -> untouched
// - host differs from the site's root host and external fetching is off -> untouched
// - otherwise -> path of the mirrored file, reported as discovered
//
// Submodules:
// - html: rewrites a/link/script/img attributes on the parsed document
// - css: rewrites url() and @import references in a stylesheet
// - stylesheet: the CSS rule scanner used by css
// =============================================================================

mod css;
mod html;
mod stylesheet;

pub use css::rewrite_css;
pub use html::rewrite_html;

use crate::crawl::FrontierEntry;
use crate::link::{self, to_local_path, CanonicalUrl, LinkStyle, LocalPath};
use std::path::PathBuf;
use tracing::debug;
use url::Url;

/// Crawl-wide settings the rewriter needs.
#[derive(Debug, Clone)]
pub struct RewritePolicy {
    pub root_dir: PathBuf,
    pub follow_external: bool,
    pub fetch_static: bool,
    pub link_style: LinkStyle,
}

/// Per-page state for one rewrite pass.
#[derive(Debug, Clone)]
pub struct RewriteContext {
    /// Final URL of the page after redirects; relative references resolve against it
    pub base: Url,
    pub page: CanonicalUrl,
    /// Where the page itself will be written
    pub local_path: LocalPath,
    /// The page is off the site: reached as an external reference, or
    /// landed on by a redirect
    pub no_follow: bool,
    /// Host of the site being mirrored
    pub root_host: String,
}

impl RewriteContext {
    pub fn new(
        base: Url,
        page: CanonicalUrl,
        no_follow: bool,
        root_host: &str,
        policy: &RewritePolicy,
    ) -> Self {
        let local_path = to_local_path(&page, &policy.root_dir);
        RewriteContext {
            base,
            page,
            local_path,
            no_follow,
            root_host: root_host.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReferenceKind {
    /// `<a href>`: navigation, subject to no-follow
    Anchor,
    /// Everything else: stylesheets, scripts, images, CSS url()
    Resource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Decision {
    Keep,
    Absolute(String),
    Local {
        href: String,
        discovered: FrontierEntry,
    },
}

pub(crate) fn decide(
    raw: &str,
    kind: ReferenceKind,
    ctx: &RewriteContext,
    policy: &RewritePolicy,
) -> Decision {
    if kind == ReferenceKind::Anchor && ctx.no_follow {
        return match link::resolve(raw, &ctx.base) {
            Ok(absolute) => Decision::Absolute(absolute.to_string()),
            Err(_) => Decision::Keep,
        };
    }

    let target = match link::canonicalize(raw, &ctx.base) {
        Ok(target) => target,
        Err(err) => {
            debug!(reference = raw, error = %err, "ignoring reference");
            return Decision::Keep;
        }
    };

    let is_external = target.host() != ctx.root_host;
    if is_external && !policy.follow_external {
        return Decision::Keep;
    }

    let mut href = to_local_path(&target, &policy.root_dir)
        .href_from(&ctx.local_path.directory, policy.link_style);
    let fragment = link::resolve(raw, &ctx.base)
        .ok()
        .and_then(|url| url.fragment().map(str::to_string));
    if let Some(fragment) = fragment {
        href.push('#');
        href.push_str(&fragment);
    }

    Decision::Local {
        href,
        discovered: FrontierEntry {
            url: target,
            no_follow: is_external,
        },
    }
}

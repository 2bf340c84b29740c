// src/rewrite/html.rs
// =============================================================================
// Rewrites the outbound references of an HTML page.
//
// We use the `scraper` crate which:
// - Parses HTML leniently, the way a browser does (html5ever)
// - Supports CSS selectors for finding elements
// - Gives us the document tree so attributes can be changed in place
//
// Elements visited, in document order:
//   <a href>, <link href>, <script src>, and <img src> when static assets are on
//
// <link rel="stylesheet"> is a static asset too: with static fetching off it
// is left alone, so the stylesheet is never downloaded.
// =============================================================================

use super::{decide, Decision, ReferenceKind, RewriteContext, RewritePolicy};
use crate::crawl::FrontierEntry;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

// The selector is a constant and known to be valid
static REFERENCES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href], link[href], script[src], img[src]").expect("valid selector")
});

// Rewrites every reference on the page
//
// Parameters:
//   markup: the page HTML as fetched
//   ctx: the page's own URL, local path and no-follow flag
//   policy: crawl-wide settings
//
// Returns: (serialized HTML, discovered URLs in document order)
pub fn rewrite_html(
    markup: &str,
    ctx: &RewriteContext,
    policy: &RewritePolicy,
) -> (String, Vec<FrontierEntry>) {
    let mut document = Html::parse_document(markup);

    // Collect first: the tree cannot be mutated while select() borrows it
    let targets: Vec<_> = document
        .select(&REFERENCES)
        .filter_map(|element| {
            reference_of(element, policy).map(|(attr, value, kind)| (element.id(), attr, value, kind))
        })
        .collect();

    let mut discovered = Vec::new();
    for (node_id, attr, value, kind) in targets {
        let href = match decide(&value, kind, ctx, policy) {
            Decision::Keep => continue,
            Decision::Absolute(url) => url,
            Decision::Local {
                href,
                discovered: entry,
            } => {
                discovered.push(entry);
                href
            }
        };

        if let Some(mut node) = document.tree.get_mut(node_id) {
            if let Node::Element(element) = node.value() {
                for (name, current) in element.attrs.iter_mut() {
                    if &*name.local == attr {
                        current.clear();
                        current.push_slice(&href);
                    }
                }
            }
        }
    }

    (document.html(), discovered)
}

// Picks the attribute to rewrite on a selected element, or None to skip it
fn reference_of(
    element: ElementRef<'_>,
    policy: &RewritePolicy,
) -> Option<(&'static str, String, ReferenceKind)> {
    let el = element.value();
    let (attr, kind) = match el.name() {
        "a" => ("href", ReferenceKind::Anchor),
        "link" if is_stylesheet(el.attr("rel")) && !policy.fetch_static => return None,
        "link" => ("href", ReferenceKind::Resource),
        "script" => ("src", ReferenceKind::Resource),
        "img" if policy.fetch_static => ("src", ReferenceKind::Resource),
        _ => return None,
    };

    let value = el.attr(attr)?.to_string();
    Some((attr, value, kind))
}

fn is_stylesheet(rel: Option<&str>) -> bool {
    rel.map(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
    .unwrap_or(false)
}

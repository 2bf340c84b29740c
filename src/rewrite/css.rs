// src/rewrite/css.rs
// =============================================================================
// Rewrites the references of a stylesheet.
//
// The scanner tells us which URL values the sheet contains; the rewrite then
// happens on the raw text with exact literal substitution. A URL value that
// also appears verbatim somewhere unrelated (a comment, a content: string)
// is replaced there too. Substitutions run in a single left-to-right pass,
// longest literal first, so a rewritten value is never matched again.
// =============================================================================

use super::stylesheet::parse_stylesheet;
use super::{decide, Decision, ReferenceKind, RewriteContext, RewritePolicy};
use crate::crawl::FrontierEntry;
use crate::error::CloneError;
use regex::Regex;
use std::collections::HashMap;

// Rewrites every url()/@import reference in `source`
//
// Returns: (rewritten stylesheet, discovered URLs in order of appearance),
// or a Parse error when the sheet has an unterminated comment or string
pub fn rewrite_css(
    source: &str,
    ctx: &RewriteContext,
    policy: &RewritePolicy,
) -> Result<(String, Vec<FrontierEntry>), CloneError> {
    let sheet = parse_stylesheet(source).map_err(|reason| CloneError::Parse {
        url: ctx.page.to_string(),
        what: "stylesheet",
        reason,
    })?;

    let mut replacements: HashMap<String, String> = HashMap::new();
    let mut discovered = Vec::new();

    for uri in sheet.uri_references() {
        if uri.is_empty() || replacements.contains_key(&uri) {
            continue;
        }
        match decide(&uri, ReferenceKind::Resource, ctx, policy) {
            Decision::Keep => {}
            Decision::Absolute(href) => {
                replacements.insert(uri, href);
            }
            Decision::Local {
                href,
                discovered: entry,
            } => {
                discovered.push(entry);
                replacements.insert(uri, href);
            }
        }
    }

    Ok((substitute(source, &replacements), discovered))
}

fn substitute(source: &str, replacements: &HashMap<String, String>) -> String {
    if replacements.is_empty() {
        return source.to_string();
    }

    let mut literals: Vec<&str> = replacements.keys().map(String::as_str).collect();
    // alternation is leftmost-first, so longer literals must come first
    literals.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

    let pattern = literals
        .iter()
        .map(|literal| regex::escape(literal))
        .collect::<Vec<_>>()
        .join("|");

    match Regex::new(&pattern) {
        Ok(matcher) => matcher
            .replace_all(source, |caps: &regex::Captures| {
                replacements
                    .get(&caps[0])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned(),
        // only reachable if the pattern outgrows the regex size limit
        Err(_) => {
            let mut out = source.to_string();
            for literal in literals {
                out = out.replace(literal, &replacements[literal]);
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{context, policy};
    use super::*;

    #[test]
    fn test_rewrites_urls_and_imports() {
        let policy = policy(false, true);
        let ctx = context("http://example.com/css/site.css", false, &policy);
        let css = r#"@import "base.css";
body { background: url(../img/bg.png) }
@media print { .x { background: url('/print.png') } }"#;

        let (out, discovered) = rewrite_css(css, &ctx, &policy).unwrap();
        assert!(out.contains(r#"@import "/mirror/example.com/css/base.css";"#));
        assert!(out.contains("url(/mirror/example.com/img/bg.png)"));
        assert!(out.contains("url('/mirror/example.com/print.png')"));

        let paths: Vec<&str> = discovered.iter().map(|e| e.url.path()).collect();
        assert_eq!(paths, vec!["/css/base.css", "/img/bg.png", "/print.png"]);
    }

    #[test]
    fn test_external_urls_untouched_when_disabled() {
        let policy = policy(false, true);
        let ctx = context("http://example.com/site.css", false, &policy);
        let css = "a { background: url(http://cdn.other.com/a.png) }";
        let (out, discovered) = rewrite_css(css, &ctx, &policy).unwrap();
        assert_eq!(out, css);
        assert!(discovered.is_empty());
    }

    #[test]
    fn test_duplicate_urls_are_discovered_once() {
        let policy = policy(false, true);
        let ctx = context("http://example.com/site.css", false, &policy);
        let css = ".a { background: url(a.png) } .b { background: url(a.png) }";
        let (out, discovered) = rewrite_css(css, &ctx, &policy).unwrap();
        assert_eq!(discovered.len(), 1);
        assert_eq!(out.matches("url(/mirror/example.com/a.png)").count(), 2);
    }

    #[test]
    fn test_single_pass_substitution() {
        // "a.png" is a substring of "ba.png"; each must map to its own target
        let policy = policy(false, true);
        let ctx = context("http://example.com/site.css", false, &policy);
        let css = ".x { background: url(a.png) } .y { background: url(ba.png) }";
        let (out, _) = rewrite_css(css, &ctx, &policy).unwrap();
        assert!(out.contains("url(/mirror/example.com/a.png)"));
        assert!(out.contains("url(/mirror/example.com/ba.png)"));
    }

    #[test]
    fn test_unterminated_string_is_parse_error() {
        let policy = policy(false, true);
        let ctx = context("http://example.com/site.css", false, &policy);
        let result = rewrite_css("a { content: \"oops\n }", &ctx, &policy);
        assert!(matches!(result, Err(CloneError::Parse { .. })));
    }
}

//! Relocation of relative asset URLs into the archive's `/data/` path space.

use crate::attr::{trim_value, VALUE_PATTERN};
use crate::edit::{apply_edits, Edit};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Prefix every relocated URL gets.
pub const DATA_PREFIX: &str = "/data/";

/// URL prefixes that are already absolute (or anchors) and are never rewritten.
const PASSTHROUGH_PREFIXES: &[&str] = &["#", "/", "http://", "https://"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UrlSite {
    /// `href=`, `src=`, `action=`, `background=`; rewritten URL is double-quoted.
    Attribute,
    /// CSS `url(...)`; rewritten URL is wrapped in parens.
    Css,
}

fn attribute_url_regex() -> &'static Regex {
    static ATTRIBUTE_URL_REGEX: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE_URL_REGEX.get_or_init(|| {
        Regex::new(&format!(
            r"(?is)((?:href|src|action|background) *= *)({})",
            VALUE_PATTERN
        ))
        .unwrap()
    })
}

fn css_url_regex() -> &'static Regex {
    static CSS_URL_REGEX: OnceLock<Regex> = OnceLock::new();
    CSS_URL_REGEX.get_or_init(|| Regex::new(r"(?is)(url *)(\(.+?\))").unwrap())
}

/// Rewrite every relative URL in `page` to `/data/<resolved archive path>`.
///
/// `page_path` is the archive-relative path of the page itself (e.g.
/// `www.example.com/cards/0001/index.html`); relative URLs resolve against it as if it
/// were `https://<page_path>`. Running this over its own output changes nothing.
pub fn redirect_links(page: &str, page_path: &str) -> String {
    let base = match Url::parse(&format!("https://{}", page_path)) {
        Ok(base) => base,
        Err(e) => {
            tracing::debug!(page_path, error = %e, "archive path is not a valid base url");
            return page.to_string();
        }
    };

    let mut edits = Vec::new();
    for (regex, site) in [
        (attribute_url_regex(), UrlSite::Attribute),
        (css_url_regex(), UrlSite::Css),
    ] {
        for caps in regex.captures_iter(page) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let url = trim_value(&caps[2]);
            let Some(archive_url) = relocate_url(&base, &url) else {
                continue;
            };
            let wrapped = match site {
                UrlSite::Attribute => format!("\"{}\"", archive_url),
                UrlSite::Css => format!("({})", archive_url),
            };
            edits.push(Edit::new(whole.range(), format!("{}{}", &caps[1], wrapped)));
        }
    }

    tracing::trace!(page_path, count = edits.len(), "relocating links");
    apply_edits(page, edits)
}

/// Resolve `url` against `base` and map it into `/data/`.
///
/// Returns `None` for URLs that must stay as they are: anchors, absolute paths, absolute
/// http(s) URLs, and URLs that resolve to a different scheme (`mailto:`, `javascript:`).
pub fn relocate_url(base: &Url, url: &str) -> Option<String> {
    if PASSTHROUGH_PREFIXES.iter().any(|p| url.starts_with(p)) {
        return None;
    }
    let resolved = base.join(url).ok()?;
    if resolved.scheme() != "https" {
        return None;
    }
    let archive_path = resolved.as_str().strip_prefix("https://")?;
    Some(format!("{}{}", DATA_PREFIX, archive_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE_PATH: &str = "www.example.com/cards/0001/index.html";

    #[test]
    fn relative_attribute_urls() {
        let page = r#"<img src="pic.gif"><a href=next.html>next</a>"#;
        assert_eq!(
            redirect_links(page, PAGE_PATH),
            r#"<img src="/data/www.example.com/cards/0001/pic.gif"><a href="/data/www.example.com/cards/0001/next.html">next</a>"#
        );
    }

    #[test]
    fn parent_and_root_relative_segments() {
        let page = r#"<img src="../shared/bg.jpg"><img src="./a/b.gif">"#;
        assert_eq!(
            redirect_links(page, PAGE_PATH),
            r#"<img src="/data/www.example.com/cards/shared/bg.jpg"><img src="/data/www.example.com/cards/0001/a/b.gif">"#
        );
    }

    #[test]
    fn attribute_name_text_is_preserved() {
        let page = r#"<TD BACKGROUND = "tile.gif">"#;
        assert_eq!(
            redirect_links(page, PAGE_PATH),
            r#"<TD BACKGROUND = "/data/www.example.com/cards/0001/tile.gif">"#
        );
    }

    #[test]
    fn css_urls() {
        let page = r#"<div style="background: url('x.png')"></div><style>p { background: url ("y.png") }</style>"#;
        // Known-odd: single quotes inside `url(...)` are not unwrapped, so they become part
        // of the relocated path.
        assert_eq!(
            redirect_links(page, PAGE_PATH),
            concat!(
                r#"<div style="background: url(/data/www.example.com/cards/0001/'x.png')"></div>"#,
                r#"<style>p { background: url (/data/www.example.com/cards/0001/y.png) }</style>"#,
            )
        );
    }

    #[test]
    fn css_url_without_quotes() {
        let page = "<style>body { background: url(stars.gif) }</style>";
        assert_eq!(
            redirect_links(page, PAGE_PATH),
            "<style>body { background: url(/data/www.example.com/cards/0001/stars.gif) }</style>"
        );
    }

    #[test]
    fn absolute_and_anchor_urls_pass_through() {
        let page = concat!(
            r##"<a href="#top">"##,
            r#"<a href="/about">"#,
            r#"<a href="http://example.org/">"#,
            r#"<a href="https://example.org/">"#,
            r#"<a href="mailto:someone@example.org">"#,
        );
        assert_eq!(redirect_links(page, PAGE_PATH), page);
    }

    #[test]
    fn rewriting_is_idempotent() {
        let page = concat!(
            r#"<body background="bg.gif"><form action=send.cgi>"#,
            r#"<img src="../img/a.gif"><p style="background:url(b.gif)">"#,
            r##"<a href="#x">x</a></body>"##,
        );
        let once = redirect_links(page, PAGE_PATH);
        let twice = redirect_links(&once, PAGE_PATH);
        assert_eq!(once, twice);
        assert!(once.contains(r#"action="/data/www.example.com/cards/0001/send.cgi""#));
    }

    #[test]
    fn matches_from_both_scans_apply_in_order() {
        let page = r#"<p style="background:url(a.gif)"><img src="b.gif"><p style="background:url(c.gif)">"#;
        assert_eq!(
            redirect_links(page, PAGE_PATH),
            concat!(
                r#"<p style="background:url(/data/www.example.com/cards/0001/a.gif)">"#,
                r#"<img src="/data/www.example.com/cards/0001/b.gif">"#,
                r#"<p style="background:url(/data/www.example.com/cards/0001/c.gif)">"#,
            )
        );
    }

    #[test]
    fn invalid_base_leaves_page_untouched() {
        let page = r#"<img src="a.gif">"#;
        assert_eq!(redirect_links(page, ""), page);
    }

    #[test]
    fn relocate_url_uppercase_host_is_normalized() {
        let base = Url::parse("https://WWW.Example.com/x/index.html").unwrap();
        assert_eq!(
            relocate_url(&base, "y.gif").as_deref(),
            Some("/data/www.example.com/x/y.gif")
        );
    }
}

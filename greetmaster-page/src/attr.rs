//! `name=value` attribute scanning over raw tag text.

use regex::{CaptureMatches, Regex};
use std::sync::OnceLock;

/// Attribute extracted from tag text. `name` is lower-cased, `value` is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Quoted values run to the next `"` before a `>`; unquoted ones stop at a space or `>`.
pub(crate) const VALUE_PATTERN: &str = r#""[^>]+?"|[^ >]+"#;

fn attribute_regex() -> &'static Regex {
    static ATTRIBUTE_REGEX: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE_REGEX.get_or_init(|| {
        Regex::new(&format!(r"(?is)([a-z]+) *= *({})", VALUE_PATTERN)).unwrap()
    })
}

/// Lazy iterator over the attributes of a tag.
pub struct Attributes<'t> {
    inner: CaptureMatches<'static, 't>,
}

impl Iterator for Attributes<'_> {
    type Item = Attribute;

    fn next(&mut self) -> Option<Attribute> {
        let caps = self.inner.next()?;
        Some(Attribute {
            name: caps[1].to_ascii_lowercase(),
            value: trim_value(&caps[2]),
        })
    }
}

/// Scan `tag` for `name=value` pairs.
pub fn attributes(tag: &str) -> Attributes<'_> {
    Attributes {
        inner: attribute_regex().captures_iter(tag),
    }
}

/// Strip surrounding whitespace and wrapping, then embedded line breaks.
///
/// `(…)` wrappers (CSS `url(...)` arguments) are removed together with an optional inner
/// pair of quotes; otherwise a single optional leading and trailing `"` is removed.
pub fn trim_value(raw: &str) -> String {
    let s = raw.trim();
    let inner = if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        let s = &s[1..s.len() - 1];
        let s = s.strip_prefix('"').unwrap_or(s);
        s.strip_suffix('"').unwrap_or(s)
    } else {
        let s = s.strip_prefix('"').unwrap_or(s);
        s.strip_suffix('"').unwrap_or(s)
    };
    inner
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(tag: &str) -> Vec<(String, String)> {
        attributes(tag).map(|a| (a.name, a.value)).collect()
    }

    #[test]
    fn trim_quoted() {
        assert_eq!(trim_value("\"foo bar\""), "foo bar");
        assert_eq!(trim_value("  \"padded\"  "), "padded");
    }

    #[test]
    fn trim_parens() {
        assert_eq!(trim_value("(url.png)"), "url.png");
        assert_eq!(trim_value("(\"quoted.png\")"), "quoted.png");
        assert_eq!(trim_value("( spaced.png )"), "spaced.png");
    }

    #[test]
    fn trim_strips_line_breaks() {
        assert_eq!(trim_value("\"a\nb\""), "ab");
        assert_eq!(trim_value("\"a\r\nb\""), "ab");
    }

    #[test]
    fn trim_unbalanced_quote() {
        assert_eq!(trim_value("\"open"), "open");
        assert_eq!(trim_value("close\""), "close");
    }

    #[test]
    fn attributes_quoted_and_unquoted() {
        assert_eq!(
            pairs(r##"<body BGCOLOR=red text = "#000000" topmargin=5>"##),
            vec![
                ("bgcolor".to_string(), "red".to_string()),
                ("text".to_string(), "#000000".to_string()),
                ("topmargin".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn attributes_keep_value_case() {
        assert_eq!(
            pairs(r#"<embed SRC="Song.MID">"#),
            vec![("src".to_string(), "Song.MID".to_string())]
        );
    }

    #[test]
    fn quoted_value_spans_lines() {
        assert_eq!(
            pairs("<a href=\"page\n.html\">"),
            vec![("href".to_string(), "page.html".to_string())]
        );
    }

    #[test]
    fn no_attributes() {
        assert!(pairs("<body>").is_empty());
    }
}

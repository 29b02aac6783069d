//! Editable `[Field Name]` tokens in archived cards.
//!
//! Without caller data every token becomes an editable placeholder (authoring). With
//! caller data each token is replaced by the supplied text, or by its own bracketed text
//! when no value was supplied (rendering). The `Mambo` field renders as a row of glyph images
//! instead of text.

use crate::edit::{apply_edits, Edit};
use crate::error::PageResult;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Field rendered through glyph transliteration.
pub const GLYPH_FIELD: &str = "Mambo";

/// Cards whose glyph row ends with an extra `special` glyph.
pub const SPECIAL_GLYPH_CARDS: [&str; 2] = ["3020041", "3020042"];

const SPECIAL_GLYPH: &str = "special";
const GLYPH_SPACE: &str = r#"<span class="greetmaster-glyph-space"></span>"#;
const LINE_BREAK: &str = "<br>";

fn token_regex() -> &'static Regex {
    static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    TOKEN_REGEX.get_or_init(|| Regex::new(r"(?i)\[([a-z0-9 ]+)\]").unwrap())
}

/// Field values supplied by the caller, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues(HashMap<String, String>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a URL-encoded query string. The first value of a repeated name wins.
    pub fn from_query(query: &str) -> Self {
        let mut values = HashMap::new();
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            values.entry(name.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self(values)
    }

    /// Decode a base64 blob holding a URL-encoded query string of field values.
    ///
    /// Padding is optional and the URL-safe alphabet is accepted. Spaces are read as `+`,
    /// since an unescaped `+` in a query parameter arrives as a space.
    pub fn decode(blob: &str) -> PageResult<Self> {
        let cleaned: String = blob
            .trim()
            .trim_end_matches('=')
            .chars()
            .map(|c| if c == ' ' { '+' } else { c })
            .collect();
        let bytes = STANDARD_NO_PAD
            .decode(&cleaned)
            .or_else(|_| URL_SAFE_NO_PAD.decode(&cleaned))?;
        let query = String::from_utf8(bytes)?;
        Ok(Self::from_query(&query))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How editable tokens are substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMode {
    /// Tokens become editable placeholders.
    Authoring,
    /// Tokens become the supplied values (or their own text).
    Rendering(FieldValues),
}

impl FieldMode {
    /// Mode for an optional encoded request parameter.
    ///
    /// A parameter that fails to decode still selects rendering, with every field falling
    /// back to its own text.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            None => FieldMode::Authoring,
            Some(blob) => match FieldValues::decode(blob) {
                Ok(values) => FieldMode::Rendering(values),
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring undecodable field data");
                    FieldMode::Rendering(FieldValues::new())
                }
            },
        }
    }
}

/// Card-level context for glyph image URLs.
#[derive(Debug, Clone, Copy)]
pub struct GlyphContext<'a> {
    /// Archive directory holding the card's assets (no leading or trailing slash).
    pub asset_dir: &'a str,
    pub card_id: &'a str,
}

/// Replace every editable token in `body` according to `mode`.
pub fn substitute_fields(body: &str, mode: &FieldMode, glyphs: GlyphContext<'_>) -> String {
    let mut edits = Vec::new();
    for caps in token_regex().captures_iter(body) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let inner = inner.as_str();
        let name = inner.trim();
        if name.is_empty() {
            continue;
        }
        let replacement = match mode {
            FieldMode::Authoring => editable_placeholder(name, inner),
            FieldMode::Rendering(values) => {
                let value = values.get(name).unwrap_or(inner);
                if name == GLYPH_FIELD {
                    glyph_row(value, glyphs)
                } else {
                    escape_text(value)
                }
            }
        };
        edits.push(Edit::new(whole.range(), replacement));
    }
    apply_edits(body, edits)
}

fn editable_placeholder(name: &str, inner: &str) -> String {
    format!(
        r#"<span class="greetmaster-field" data-field="{}" contenteditable="true">{}</span>"#,
        name, inner
    )
}

/// HTML-escape `value` and turn its line breaks into `<br>`.
pub fn escape_text(value: &str) -> String {
    let escaped = html_escape::encode_text(value);
    escaped.replace("\r\n", "\n").replace('\n', LINE_BREAK)
}

/// Glyph image name for a lower-cased character, or `None` when there is no glyph for it.
pub fn glyph_name(c: char) -> Option<String> {
    if c.is_ascii_lowercase() || c.is_ascii_digit() {
        return Some(c.to_string());
    }
    let name = match c {
        '\'' => "apos",
        ',' => "comma",
        '!' => "exclam",
        '.' => "period",
        '?' => "question",
        _ => return None,
    };
    Some(name.to_string())
}

/// Transliterate `value` into glyph images under the card's `ma/<card id>/` directory.
pub fn glyph_row(value: &str, ctx: GlyphContext<'_>) -> String {
    let mut out = String::new();
    for c in value.to_lowercase().chars() {
        match c {
            ' ' | '\u{a0}' => out.push_str(GLYPH_SPACE),
            '\n' => out.push_str(LINE_BREAK),
            _ => {
                if let Some(name) = glyph_name(c) {
                    out.push_str(&glyph_image(ctx, &name));
                }
            }
        }
    }
    if SPECIAL_GLYPH_CARDS.contains(&ctx.card_id) {
        out.push_str(&glyph_image(ctx, SPECIAL_GLYPH));
    }
    out
}

fn glyph_image(ctx: GlyphContext<'_>, name: &str) -> String {
    format!(
        r#"<img class="greetmaster-glyph" src="/data/{}/ma/{}/{}.gif" alt="">"#,
        ctx.asset_dir, ctx.card_id, name
    )
}

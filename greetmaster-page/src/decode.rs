//! Decoding archived page bytes into normalized UTF-8 text.

use crate::error::{PageError, PageResult};
use encoding_rs::Encoding;
use regex::Regex;
use std::sync::OnceLock;

fn line_break_regex() -> &'static Regex {
    static LINE_BREAK_REGEX: OnceLock<Regex> = OnceLock::new();
    LINE_BREAK_REGEX.get_or_init(|| Regex::new(r"[\r\n]+").unwrap())
}

/// Decode `bytes` using the archive's encoding label and collapse runs of line breaks.
///
/// `ASCII`, `UTF-8` and a missing label are read as UTF-8, replacing invalid sequences.
/// Other labels go through the WHATWG label table (`windows-1252`, `Shift_JIS`, ...).
pub fn decode_page(bytes: &[u8], label: Option<&str>) -> PageResult<String> {
    let text = match label.map(str::trim) {
        None | Some("") => String::from_utf8_lossy(bytes).into_owned(),
        Some(l) if l.eq_ignore_ascii_case("ascii") || l.eq_ignore_ascii_case("utf-8") => {
            String::from_utf8_lossy(bytes).into_owned()
        }
        Some(l) => {
            let encoding = Encoding::for_label(l.as_bytes()).ok_or_else(|| {
                PageError::UnknownEncoding {
                    label: l.to_string(),
                }
            })?;
            let (text, _, had_errors) = encoding.decode(bytes);
            if had_errors {
                tracing::debug!(encoding = encoding.name(), "page contained undecodable bytes");
            }
            text.into_owned()
        }
    };
    Ok(normalize_line_breaks(&text))
}

/// Collapse every run of `\r`/`\n` characters into a single `\n`.
pub fn normalize_line_breaks(text: &str) -> String {
    line_break_regex().replace_all(text, "\n").into_owned()
}

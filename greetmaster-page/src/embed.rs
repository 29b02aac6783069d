//! Legacy background-sound tags (`<embed>`, `<bgsound>`) folded into one MIDI placeholder.

use crate::attr::attributes;
use crate::edit::{apply_edits, Edit};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

pub const MIDI_PLACEHOLDER_ID: &str = "greetmaster-midi-placeholder";

/// Loop count meaning "repeat forever".
pub const LOOP_FOREVER: i32 = -1;

/// Playback metadata harvested from a page's sound tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedInfo {
    pub src: String,
    /// `-1` loops forever, `0` plays once with looping disabled, `n > 0` repeats `n` times.
    pub loop_count: i32,
}

impl EmbedInfo {
    /// Placeholder element read by the client-side MIDI player.
    pub fn placeholder(&self) -> String {
        format!(
            r#"<div id="{}" data-src="{}" data-loop="{}"></div>"#,
            MIDI_PLACEHOLDER_ID,
            html_escape::encode_double_quoted_attribute(&self.src),
            self.loop_count
        )
    }
}

fn embed_regex() -> &'static Regex {
    static EMBED_REGEX: OnceLock<Regex> = OnceLock::new();
    EMBED_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\s*(<(?:embed|bgsound|noembed>\s*<bgsound)[^>]+>)(?:\s*</(?:no)?embed>)?")
            .unwrap()
    })
}

struct SoundTags {
    ranges: Vec<Range<usize>>,
    info: Option<EmbedInfo>,
}

fn scan(body: &str) -> SoundTags {
    let mut ranges = Vec::new();
    let mut loop_count = LOOP_FOREVER;
    let mut info = None;

    for caps in embed_regex().captures_iter(body) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        ranges.push(whole.range());
        if info.is_some() {
            continue;
        }
        // Tags are read until one names a MIDI file; loop settings seen on the way carry over.
        let mut src = None;
        for attr in attributes(&caps[1]) {
            match attr.name.as_str() {
                "src" | "bgsound" if attr.value.to_ascii_lowercase().ends_with(".mid") => {
                    src = Some(attr.value);
                }
                "loop" => loop_count = parse_loop(&attr.value).unwrap_or(loop_count),
                _ => {}
            }
        }
        info = src.map(|src| EmbedInfo { src, loop_count });
    }

    SoundTags { ranges, info }
}

fn parse_loop(value: &str) -> Option<i32> {
    let value = value.to_ascii_lowercase();
    match value.as_str() {
        "false" | "no" => Some(0),
        _ => value.parse().ok(),
    }
}

/// Metadata of the page's background MIDI, if any sound tag names a `.mid` source.
pub fn find_embed(body: &str) -> Option<EmbedInfo> {
    scan(body).info
}

/// Replace the page's sound tags with a single MIDI placeholder.
///
/// The placeholder takes the position of the first sound tag; every other matched tag is
/// removed. Without a `.mid` source the body is returned unchanged.
pub fn rewrite_embeds(body: &str) -> String {
    let SoundTags { ranges, info } = scan(body);
    let Some(info) = info else {
        return body.to_string();
    };
    tracing::debug!(src = %info.src, loop_count = info.loop_count, tags = ranges.len(), "replacing sound tags");

    let placeholder = info.placeholder();
    let edits = ranges
        .into_iter()
        .enumerate()
        .map(|(i, range)| {
            if i == 0 {
                Edit::new(range, placeholder.clone())
            } else {
                Edit::remove(range)
            }
        })
        .collect();
    apply_edits(body, edits)
}

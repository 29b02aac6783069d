//! Offset-based string edits, collected against an original string and applied in one pass.

use std::ops::Range;

/// Replacement of `range` (byte offsets into the original string) with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Edit {
    pub fn new(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    /// Edit that deletes `range`.
    pub fn remove(range: Range<usize>) -> Self {
        Self::new(range, String::new())
    }
}

/// Applies `edits` to `original` in a single forward pass.
///
/// Edits may be supplied in any order; they are sorted by start offset first. An edit that
/// starts inside a previously applied one is dropped, so the earliest-starting edit wins
/// (ties go to whichever was collected first).
pub fn apply_edits(original: &str, mut edits: Vec<Edit>) -> String {
    if edits.is_empty() {
        return original.to_string();
    }
    edits.sort_by_key(|e| e.range.start);

    let mut out = String::with_capacity(original.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.range.start < cursor || edit.range.end > original.len() {
            continue;
        }
        out.push_str(&original[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&original[cursor..]);
    out
}

//! Greeting and filesystem indexes, card filters and media selection.

use crate::error::{ServerError, ServerResult};
use greetmaster_page::CardMedia;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Fields a client may request from `/get`, in output order.
pub const FIELDS: [&str; 6] = ["titles", "categories", "sources", "type", "thumbnail", "files"];

/// Most filters honored from one query string.
pub const MAX_FILTERS: usize = 16;

/// Display name of a supported card type.
pub fn type_name(kind: &str) -> Option<&'static str> {
    let name = match kind {
        "flashEcard" => "Flash E-Card",
        "htmlEcard" => "HTML E-Card",
        "animatedTextEcard" => "Animated Text E-Card",
        "photoVideoEcard" => "Photo/Video E-Card",
        "imageEcard" => "Image E-Card",
        "downloadableEcard" => "Downloadable E-Card",
        "javaEcard" => "Java E-Card",
        "shockwaveEcard" => "Shockwave E-Card",
        "wallpaperPreview" => "Wallpaper Preview",
        "screensaverPreview" => "Screensaver Preview",
        "creataMailTemplate" => "CreataMail Template",
        _ => return None,
    };
    Some(name)
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Greeting {
    pub titles: Vec<String>,
    pub categories: Vec<String>,
    pub sources: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub thumbnail: Value,
    pub files: Vec<String>,
    pub available: bool,
}

impl Greeting {
    /// Available and of a supported type.
    pub fn is_valid(&self) -> bool {
        self.available && type_name(&self.kind).is_some()
    }

    /// JSON value of one of [`FIELDS`].
    pub fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "titles" => Value::from(self.titles.clone()),
            "categories" => Value::from(self.categories.clone()),
            "sources" => Value::from(self.sources.clone()),
            "type" => Value::from(self.kind.clone()),
            "thumbnail" => self.thumbnail.clone(),
            "files" => Value::from(self.files.clone()),
            _ => return None,
        };
        Some(value)
    }

    /// Page title: the first title with its line break flattened.
    pub fn display_title(&self) -> Option<String> {
        let title = self.titles.first()?;
        Some(replace_first_break(title))
    }

    fn find_file(&self, pred: impl Fn(&str) -> bool) -> Option<&str> {
        self.files.iter().map(String::as_str).find(|f| pred(f))
    }
}

// First `<br>`, case-insensitive, becomes a space.
fn replace_first_break(title: &str) -> String {
    match title.to_ascii_lowercase().find("<br>") {
        Some(i) => format!("{} {}", &title[..i], &title[i + 4..]),
        None => title.to_string(),
    }
}

/// Greetings keyed by id, iterated in index order.
///
/// Index order puts integer ids first in ascending numeric order, followed by all other ids
/// in file order.
#[derive(Debug, Clone, Default)]
pub struct GreetingIndex {
    entries: Vec<(String, Greeting)>,
    positions: HashMap<String, usize>,
}

impl GreetingIndex {
    pub fn load(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ServerResult<Self> {
        let raw: serde_json::Map<String, Value> =
            serde_json::from_str(content).map_err(|e| ServerError::Index(e.to_string()))?;
        let mut entries = Vec::with_capacity(raw.len());
        for (id, value) in raw {
            let greeting: Greeting = serde_json::from_value(value)
                .map_err(|e| ServerError::Index(format!("greeting {}: {}", id, e)))?;
            entries.push((id, greeting));
        }
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(mut entries: Vec<(String, Greeting)>) -> Self {
        entries.sort_by_key(|(id, _)| match integer_key(id) {
            Some(n) => (0, n),
            None => (1, 0),
        });
        let positions = entries
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (id.clone(), i))
            .collect();
        Self { entries, positions }
    }

    pub fn get(&self, id: &str) -> Option<&Greeting> {
        self.positions.get(id).map(|&i| &self.entries[i].1)
    }

    /// The greeting with `id`, if it is valid.
    pub fn valid(&self, id: &str) -> Option<&Greeting> {
        self.get(id).filter(|g| g.is_valid())
    }

    /// Valid greetings in index order.
    pub fn iter_valid(&self) -> impl Iterator<Item = (&str, &Greeting)> {
        self.entries
            .iter()
            .filter(|(_, g)| g.is_valid())
            .map(|(id, g)| (id.as_str(), g))
    }

    /// Valid greetings passing every filter, in index order.
    pub fn matching<'a>(
        &'a self,
        filters: &'a [Filter],
    ) -> impl Iterator<Item = (&'a str, &'a Greeting)> + 'a {
        self.iter_valid()
            .filter(move |(_, g)| filters.iter().all(|f| f.matches(g)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// Canonical non-negative integer key ("0", "17"; not "017" or "-1").
fn integer_key(id: &str) -> Option<u32> {
    let n: u32 = id.parse().ok()?;
    (n != u32::MAX && n.to_string() == id).then_some(n)
}

/// Per-file metadata from the filesystem index.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileInfo {
    pub encoding: Option<String>,
    pub width: f64,
    pub height: f64,
    pub protected: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    files: HashMap<String, FileInfo>,
}

impl FileIndex {
    pub fn load(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ServerResult<Self> {
        let files = serde_json::from_str(content).map_err(|e| ServerError::Index(e.to_string()))?;
        Ok(Self { files })
    }

    pub fn get(&self, path: &str) -> Option<&FileInfo> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    Search,
    Title,
    Category,
    Source,
    Type,
}

impl FilterKey {
    pub fn parse(key: &str) -> Option<Self> {
        let key = match key {
            "search" => FilterKey::Search,
            "title" => FilterKey::Title,
            "category" => FilterKey::Category,
            "source" => FilterKey::Source,
            "type" => FilterKey::Type,
            _ => return None,
        };
        Some(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub key: FilterKey,
    pub value: String,
}

impl Filter {
    pub fn new(key: FilterKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    pub fn matches(&self, greeting: &Greeting) -> bool {
        let value = self.value.as_str();
        match self.key {
            FilterKey::Search => {
                let needle = value.to_lowercase();
                greeting
                    .titles
                    .iter()
                    .chain(&greeting.categories)
                    .any(|entry| entry.to_lowercase().replacen("<br>", " ", 1).contains(&needle))
            }
            FilterKey::Title => greeting.titles.iter().any(|t| t == value),
            FilterKey::Category => greeting.categories.iter().any(|c| c == value),
            FilterKey::Source => greeting.sources.iter().any(|s| s == value),
            FilterKey::Type => greeting.kind == value,
        }
    }
}

/// Filters named in a query: known keys with non-empty values, at most [`MAX_FILTERS`].
pub fn request_filters<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<Filter> {
    params
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .filter_map(|(key, value)| FilterKey::parse(key).map(|key| Filter::new(key, value)))
        .take(MAX_FILTERS)
        .collect()
}

fn image_regex() -> &'static Regex {
    static IMAGE_REGEX: OnceLock<Regex> = OnceLock::new();
    IMAGE_REGEX.get_or_init(|| Regex::new(r"/product/full/\d{7}f\.gif$").unwrap())
}

fn emulated_regex() -> &'static Regex {
    static EMULATED_REGEX: OnceLock<Regex> = OnceLock::new();
    EMULATED_REGEX.get_or_init(|| {
        Regex::new(r"/product/preview/slideshows/exe/\d{7}f\.exe$|\.dcr$").unwrap()
    })
}

fn is_flash(path: &str) -> bool {
    path.ends_with(".swf") || path.ends_with(".swt")
}

/// Pick the media a card page displays from the greeting's files.
///
/// An HTML page wins, then Flash, then a full-size image, then an emulated preview.
pub fn select_media(greeting: &Greeting, files: &FileIndex) -> ServerResult<CardMedia> {
    if let Some(page_path) = greeting.find_file(|f| f.ends_with(".html")) {
        return Ok(CardMedia::Html {
            page_path: page_path.to_string(),
        });
    }
    if greeting.find_file(is_flash).is_some() {
        let src = greeting
            .find_file(|f| f.ends_with(".swf"))
            .or_else(|| greeting.find_file(|f| f.ends_with(".swt")))
            .unwrap_or_default();
        let info = files
            .get(src)
            .ok_or_else(|| ServerError::Index(format!("no filesystem entry for {}", src)))?;
        return Ok(CardMedia::Flash {
            src: src.to_string(),
            width: info.width,
            height: info.height,
            protected: info.protected,
        });
    }
    if let Some(src) = greeting.find_file(|f| image_regex().is_match(f)) {
        return Ok(CardMedia::Image {
            src: src.to_string(),
        });
    }
    if let Some(src) = greeting.find_file(|f| emulated_regex().is_match(f)) {
        return Ok(CardMedia::Emulated {
            src: src.to_string(),
        });
    }
    Ok(CardMedia::Unsupported)
}

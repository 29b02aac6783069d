//! Read-only state shared by all request handlers.

use crate::config::Config;
use crate::error::ServerResult;
use crate::index::{FileIndex, GreetingIndex};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub type SharedState = Arc<AppState>;

/// Page templates loaded from the template directory.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    pub main: String,
    pub main_navigation: String,
    pub greeting: String,
    pub greeting_embed: String,
    pub about: String,
    pub error: String,
}

impl Templates {
    pub fn load(dir: &Path) -> ServerResult<Self> {
        let read = |name: &str| std::fs::read_to_string(dir.join(name));
        Ok(Self {
            main: read("main.html")?,
            main_navigation: read("main_navigation.html")?,
            greeting: read("greeting.html")?,
            greeting_embed: read("greeting_embed.html")?,
            about: read("about.html")?,
            error: read("error.html")?,
        })
    }
}

#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub greetings: GreetingIndex,
    pub files: FileIndex,
    pub templates: Templates,
}

impl AppState {
    /// Load the indexes and templates named by `config`.
    pub fn load(config: Config) -> ServerResult<Self> {
        let templates = Templates::load(&config.template_dir)?;

        let greetings = GreetingIndex::load(&config.greeting_index)?;
        info!(
            path = %display_path(&config.greeting_index),
            greetings = greetings.len(),
            "loaded greeting index"
        );

        let files = FileIndex::load(&config.filesystem_index)?;
        info!(
            path = %display_path(&config.filesystem_index),
            files = files.len(),
            "loaded filesystem index"
        );

        Ok(Self {
            config,
            greetings,
            files,
            templates,
        })
    }
}

/// Absolute form of `path` for log output, falling back to the path as given.
pub fn display_path(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

//! Server configuration, read from a JSON (or YAML) file.

use crate::error::{ServerError, ServerResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub http_port: u16,
    /// HTTPS listener port, used only when both `https_cert` and `https_key` are set.
    pub https_port: u16,
    /// PEM certificate chain for the HTTPS listener.
    pub https_cert: Option<PathBuf>,
    /// PEM private key for the HTTPS listener.
    pub https_key: Option<PathBuf>,
    pub host_name: String,
    /// Host names the server answers to. Empty allows any.
    pub access_hosts: Vec<String>,
    /// Client address prefixes that are refused.
    #[serde(rename = "blockedIPs")]
    pub blocked_ips: Vec<String>,
    /// User-agent substrings that are refused.
    #[serde(rename = "blockedUAs")]
    pub blocked_uas: Vec<String>,
    pub greeting_index: PathBuf,
    pub filesystem_index: PathBuf,
    pub template_dir: PathBuf,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    /// Log file appended to; empty disables file logging.
    pub log_file: String,
    pub log_to_console: bool,
    pub log_blocked_requests: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8991,
            https_port: 8992,
            https_cert: None,
            https_key: None,
            host_name: "0.0.0.0".to_string(),
            access_hosts: Vec::new(),
            blocked_ips: Vec::new(),
            blocked_uas: Vec::new(),
            greeting_index: PathBuf::from("greetings.json"),
            filesystem_index: PathBuf::from("files.json"),
            template_dir: PathBuf::from("templates"),
            data_dir: PathBuf::from("data"),
            static_dir: PathBuf::from("static"),
            log_file: "server.log".to_string(),
            log_to_console: true,
            log_blocked_requests: true,
        }
    }
}

impl Config {
    /// Load the config file at `path`. Returns `None` when there is no such file.
    pub fn load(path: &Path) -> ServerResult<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config = if yaml {
            Self::from_yaml(&content)?
        } else {
            Self::from_json(&content)?
        };
        Ok(Some(config))
    }

    pub fn from_json(content: &str) -> ServerResult<Self> {
        serde_json::from_str(content).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn from_yaml(content: &str) -> ServerResult<Self> {
        serde_yaml::from_str(content).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn is_blocked(&self, ip: &str, user_agent: &str) -> bool {
        self.blocked_ips.iter().any(|prefix| ip.starts_with(prefix.as_str()))
            || self.blocked_uas.iter().any(|ua| user_agent.contains(ua.as_str()))
    }

    /// Whether a request for `host` (port already stripped) may be served. Host names
    /// compare case-insensitively.
    pub fn allows_host(&self, host: &str) -> bool {
        self.access_hosts.is_empty()
            || self.access_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
    }

    /// Certificate and key paths when the HTTPS listener is enabled.
    pub fn https_files(&self) -> Option<(&Path, &Path)> {
        if self.https_port == 0 {
            return None;
        }
        match (&self.https_cert, &self.https_key) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }
}

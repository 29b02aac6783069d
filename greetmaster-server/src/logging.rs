//! Tracing subscriber setup: console and log file outputs behind an env filter.

use crate::config::Config;
use crate::error::ServerResult;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init(config: &Config) -> ServerResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console = config.log_to_console.then(|| fmt::layer());

    let file = if config.log_file.is_empty() {
        None
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    Ok(())
}

/// Request log line: `{ip} ({user agent}): {uri}`, with a `BLOCKED ` prefix when refused.
pub fn request_line(ip: &str, user_agent: &str, uri: &str, blocked: bool) -> String {
    format!(
        "{}{} ({}): {}",
        if blocked { "BLOCKED " } else { "" },
        ip,
        user_agent,
        uri
    )
}

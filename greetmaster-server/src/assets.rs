//! Static files: archived assets under `data/`, site files from the static directory.

use crate::config::Config;
use crate::error::{ServerError, ServerResult};
use crate::state::SharedState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};

const DATA_SEGMENT: &str = "data/";

/// Fallback handler serving any path no route claimed.
pub async fn static_file(State(state): State<SharedState>, uri: Uri) -> ServerResult<Response> {
    let path = resolve_asset_path(&state.config, uri.path()).ok_or(ServerError::NotFound)?;
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(ServerError::NotFound),
    }
    let bytes = tokio::fs::read(&path).await?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(([(CONTENT_TYPE, mime.essence_str().to_string())], bytes).into_response())
}

/// Map a request path to a file on disk.
///
/// Returns `None` for paths that are not valid UTF-8 once decoded, or whose path under the
/// served directory has empty, `.` or `..` segments or is otherwise not plainly relative.
pub fn resolve_asset_path(config: &Config, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let relative = decoded.trim_start_matches('/');
    let (root, relative) = match relative.strip_prefix(DATA_SEGMENT) {
        Some(archive_path) => (&config.data_dir, archive_path),
        None => (&config.static_dir, relative),
    };
    if relative.is_empty()
        || relative
            .split(['/', '\\'])
            .any(|segment| segment.is_empty() || segment == ".." || segment == ".")
    {
        return None;
    }
    let relative = Path::new(relative);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

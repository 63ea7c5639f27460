//! HTML pages and static assets

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use std::path::PathBuf;

use crate::auth::CurrentUser;
use crate::error::{ApiError, StorageError};
use crate::server::handlers::content_type_for;
use crate::server::state::AppState;
use crate::storage::resolve_within;

/// Signed-in visitors go straight to the file browser
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if state.sessions.authenticate(&headers).is_ok() {
        return Ok(Redirect::temporary("/files").into_response());
    }
    Ok(page(&state, "index.html").await?.into_response())
}

pub async fn files_page(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> Result<Html<String>, ApiError> {
    page(&state, "app.html").await
}

pub async fn terminal_page(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> Result<Html<String>, ApiError> {
    page(&state, "terminal.html").await
}

pub async fn static_asset(
    State(state): State<AppState>,
    Path(relative): Path<String>,
) -> Result<Response, ApiError> {
    let asset = tokio::task::spawn_blocking(move || locate_asset(&state, &relative))
        .await
        .map_err(|e| ApiError::Internal(format!("static lookup failed: {e}")))??;

    let content = tokio::fs::read(&asset)
        .await
        .map_err(|e| StorageError::from_io(e, "static asset"))?;
    let name = asset
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(([(CONTENT_TYPE, content_type_for(&name))], content).into_response())
}

/// Resolves an asset path inside the static directory; directories are not served
fn locate_asset(state: &AppState, relative: &str) -> Result<PathBuf, StorageError> {
    let root = state.config.server.static_dir_path().canonicalize()?;
    let asset = resolve_within(&root, relative)?;
    if !asset.is_file() {
        return Err(StorageError::NotFound(relative.to_string()));
    }
    Ok(asset)
}

async fn page(state: &AppState, name: &str) -> Result<Html<String>, ApiError> {
    let path = state.config.server.static_dir_path().join(name);
    let html = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| StorageError::from_io(e, name))?;
    Ok(Html(html))
}

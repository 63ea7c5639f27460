//! File API handlers
//!
//! Thin wrappers over [`crate::storage::operations`]: each one takes the caller's
//! identity from the session, runs the storage call on the blocking pool, and turns the
//! result into JSON or file bytes.

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{Form, Multipart, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, Stream};
use serde::Deserialize;
use std::fmt::Write;
use std::io;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::auth::CurrentUser;
use crate::error::{ApiError, StorageError};
use crate::server::handlers::content_type_for;
use crate::server::state::AppState;
use crate::storage::{ActionResult, ListResult, operations};

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct RequiredPathQuery {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MkdirForm {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub name: String,
}

/// Runs a storage call on the blocking pool
async fn blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| ApiError::Internal(format!("storage task failed: {e}")))?
        .map_err(ApiError::from)
}

pub async fn list_files(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<PathQuery>,
) -> Result<Json<ListResult>, ApiError> {
    let resolver = state.resolver.clone();
    let identity = claims.identity();
    let mut listing =
        blocking(move || operations::list_directory(&resolver, &identity, &query.path)).await?;
    listing.user = Some(claims.summary());
    Ok(Json(listing))
}

/// Multipart fields: `path` (target directory, optional) and `file`
pub async fn upload_file(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<ActionResult>, ApiError> {
    let mut directory = String::new();
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(invalid_upload)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("path") => directory = field.text().await.map_err(invalid_upload)?,
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await.map_err(invalid_upload)?;
                upload = Some((filename, content));
            }
            _ => {}
        }
    }

    let (filename, content) =
        upload.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    let resolver = state.resolver.clone();
    let identity = claims.identity();
    let result = blocking(move || {
        operations::store_file(&resolver, &identity, &directory, &filename, &content)
    })
    .await?;
    Ok(Json(result))
}

fn invalid_upload(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Invalid upload: {}", err.body_text()))
}

pub async fn download_file(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<RequiredPathQuery>,
) -> Result<Response, ApiError> {
    let relative = required(query.path)?;

    let resolver = state.resolver.clone();
    let identity = claims.identity();
    let requested = relative.clone();
    let (file_path, name) =
        blocking(move || operations::prepare_download(&resolver, &identity, &requested)).await?;

    let file = File::open(&file_path)
        .await
        .map_err(|e| StorageError::from_io(e, &relative))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| StorageError::from_io(e, &relative))?
        .len();

    let headers = [
        (CONTENT_TYPE, content_type_for(&name).to_string()),
        (CONTENT_DISPOSITION, content_disposition(&name)),
        (CONTENT_LENGTH, length.to_string()),
    ];
    Ok((headers, Body::from_stream(read_chunks(file))).into_response())
}

const DOWNLOAD_CHUNK: usize = 64 * 1024;

/// Reads a file as a stream of chunks so large models are never held in memory whole
fn read_chunks(file: File) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; DOWNLOAD_CHUNK];
        let read = file.read(&mut buf).await?;
        if read == 0 {
            return Ok(None);
        }
        buf.truncate(read);
        Ok(Some((Bytes::from(buf), file)))
    })
}

pub async fn delete_file(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<RequiredPathQuery>,
) -> Result<Json<ActionResult>, ApiError> {
    let relative = required(query.path)?;
    let resolver = state.resolver.clone();
    let identity = claims.identity();
    let result = blocking(move || operations::delete_path(&resolver, &identity, &relative)).await?;
    Ok(Json(result))
}

pub async fn make_dir(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Form(form): Form<MkdirForm>,
) -> Result<Json<ActionResult>, ApiError> {
    let resolver = state.resolver.clone();
    let identity = claims.identity();
    let result =
        blocking(move || operations::make_directory(&resolver, &identity, &form.path, &form.name))
            .await?;
    Ok(Json(result))
}

fn required(path: Option<String>) -> Result<String, ApiError> {
    path.ok_or_else(|| ApiError::BadRequest("Missing path parameter".to_string()))
}

/// `attachment` disposition with an ASCII fallback name and the exact name in
/// `filename*` (RFC 5987)
pub fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunks_cover_the_whole_file() {
        use futures::TryStreamExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.stl");
        let content: Vec<u8> = (0..DOWNLOAD_CHUNK * 2 + 17).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &content).unwrap();

        let chunks: Vec<Bytes> = read_chunks(File::open(&path).await.unwrap())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() <= DOWNLOAD_CHUNK));
        assert_eq!(chunks.concat(), content);
    }

    #[test]
    fn plain_names_are_kept() {
        assert_eq!(
            content_disposition("part.stl"),
            "attachment; filename=\"part.stl\"; filename*=UTF-8''part.stl"
        );
    }

    #[test]
    fn quotes_and_non_ascii_are_escaped() {
        let header = content_disposition("my \"gear\" ü.stl");
        assert!(header.starts_with("attachment; filename=\"my _gear_ _.stl\""));
        assert!(header.ends_with("filename*=UTF-8''my%20%22gear%22%20%C3%BC.stl"));
    }
}

use super::{ApiError, AppState};
use crate::config::PLACEHOLDER_PNG;
use crate::index::IndexedGroup;
use crate::media_cache::{is_populated, scan_cached};
use anyhow::Context;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::path::{Path as FsPath, PathBuf};
use tokio::fs::File as TokioFile;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio_util::io::ReaderStream;

const SNIFF_LEN: usize = 8192;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListingQuery {
    msg_id: Option<i64>,
    #[serde(default)]
    thumb: bool,
    #[serde(default)]
    photo: bool,
}

/// Lists known ids, returns one listing, or streams one of its files.
/// Unknown ids yield `{}`.
pub(crate) async fn get_listing(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Query(params): Query<ListingQuery>,
) -> Result<Response, ApiError> {
    let Some(msg_id) = params.msg_id else {
        if params.photo || params.thumb {
            return Err(ApiError::BadRequest("file requests need a msg_id".into()));
        }
        return Ok(Json(state.index.message_ids()).into_response());
    };

    let Some(listing) = state.index.get(msg_id) else {
        tracing::debug!(chat_id = %chat_id, msg_id, "listing not indexed");
        return Ok(Json(serde_json::json!({})).into_response());
    };

    if !params.photo && !params.thumb {
        return Ok(Json(listing).into_response());
    }

    match pick_listing_file(&listing, params.photo).await {
        Some(path) => stream_file(&path).await,
        None => serve_placeholder(&state.config.paths.placeholder_image).await,
    }
}

/// A text primary keeps no files; its follow-ons' directories are tried next.
async fn pick_listing_file(listing: &IndexedGroup, photo: bool) -> Option<PathBuf> {
    for dir in listing.candidate_dirs() {
        if let Some(path) = pick_file(dir, photo).await {
            return Some(path);
        }
    }
    None
}

async fn serve_placeholder(path: &FsPath) -> Result<Response, ApiError> {
    if path.is_file() {
        return stream_file(path).await;
    }
    tracing::debug!(path = %path.display(), "placeholder file missing; serving built-in image");
    let mut response = Response::new(Body::from(PLACEHOLDER_PNG));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(PLACEHOLDER_PNG.len()));
    Ok(response)
}

/// `photo` wins over `thumb`; a missing thumbnail falls back to the primary.
async fn pick_file(dir: &FsPath, photo: bool) -> Option<PathBuf> {
    if !is_populated(dir).await {
        return None;
    }
    let cached = scan_cached(dir).await;
    if photo || cached.thumb.is_none() {
        cached.primary.or(cached.thumb)
    } else {
        cached.thumb
    }
}

async fn stream_file(path: &FsPath) -> Result<Response, ApiError> {
    let mut file = TokioFile::open(path)
        .await
        .with_context(|| format!("unable to open {}", path.display()))?;
    let size = file
        .metadata()
        .await
        .with_context(|| format!("unable to stat {}", path.display()))?
        .len();

    let mut head = Vec::with_capacity(SNIFF_LEN);
    (&mut file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .await
        .with_context(|| format!("unable to read {}", path.display()))?;
    file.seek(SeekFrom::Start(0))
        .await
        .with_context(|| format!("unable to rewind {}", path.display()))?;

    let content_type = sniff_content_type(&head, path);
    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(CONTENT_TYPE, value);
    }
    headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
    Ok(response)
}

fn sniff_content_type(head: &[u8], path: &FsPath) -> &'static str {
    if let Some(kind) = infer::get(head) {
        return kind.mime_type();
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

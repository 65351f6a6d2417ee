//! File commands

use crate::app::AppState;
use crate::services::Upload;
use anyhow::Context;
use serde::Serialize;
use std::path::Path;

/// Metadata view of a stored file, without the payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub id: String,
    pub location: String,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    pub encoded_size: usize,
    pub created_at: String,
}

pub async fn ingest(
    state: &AppState,
    location: &str,
    path: &Path,
    mime: Option<String>,
) -> anyhow::Result<String> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = mime.unwrap_or_else(|| mime_for_path(path).to_string());

    let id = state
        .files
        .ingest(location, Some(Upload::new(filename, mime_type, data)))
        .await?;
    Ok(id)
}

pub async fn store_raw(
    state: &AppState,
    location: &str,
    path: &Path,
    mime: Option<String>,
) -> anyhow::Result<String> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mime_type = mime.unwrap_or_else(|| mime_for_path(path).to_string());

    let id = state
        .files
        .ingest_raw_buffer(location, data, &mime_type)
        .await?;
    Ok(id)
}

pub async fn get(state: &AppState, id: &str) -> anyhow::Result<String> {
    Ok(state.files.retrieve(id).await?)
}

pub async fn get_raw(state: &AppState, id: &str) -> anyhow::Result<String> {
    Ok(state.files.retrieve_raw(id).await?)
}

pub async fn info(state: &AppState, id: &str) -> anyhow::Result<String> {
    let file = state.files.retrieve_file(id).await?;
    let info = FileInfo {
        encoded_size: file.data.len(),
        id: file.id,
        location: file.location,
        filename: file.filename,
        mime_type: file.mime_type,
        size: file.size,
        created_at: file.created_at.to_rfc3339(),
    };
    Ok(serde_json::to_string_pretty(&info)?)
}

pub async fn delete(state: &AppState, id: &str) -> anyhow::Result<String> {
    state.files.delete(id).await?;
    Ok(format!("Deleted {}", id))
}

/// MIME type guessed from a file extension
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

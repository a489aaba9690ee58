//! Image Upload Handler
//!
//! Any byte stream is accepted and stored as-is under a generated name.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Response},
};
use http::header;
use serde::Serialize;
use std::path::Path as FsPath;
use tokio::io::AsyncWriteExt;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::util::{now_millis, random_token};

/// Multipart field carrying the file
pub const FIELD_NAME: &str = "image";

const DEFAULT_EXTENSION: &str = "jpg";

/// Upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Extension of the client file name, restricted to ASCII alphanumerics
fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| FsPath::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// `{unix_millis}_{9 random [a-z0-9]}.{ext}`
fn generate_file_name(ext: &str) -> String {
    format!("{}_{}.{}", now_millis(), random_token(9), ext)
}

fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains("..") && !name.contains('/') && !name.contains('\\')
}

/// Write `data` to a file that must not exist yet
///
/// A file this call created but could not finish writing is removed again.
/// An existing file is never touched.
async fn store_new_file(path: &FsPath, data: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    let written = async {
        file.write_all(data).await?;
        file.sync_all().await
    }
    .await;
    if written.is_err() {
        drop(file);
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), "Failed to remove partial upload: {e}");
        }
    }
    written
}

/// POST /api/upload - 上传单张图片
pub async fn upload(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    // Buffer the whole field first so a broken body never reaches the disk
    let mut upload: Option<(Option<String>, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_request(format!("Invalid multipart request: {e}")))?
    {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }
        let original_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid_request(format!("Multipart error: {e}")))?;
        upload = Some((original_name, data));
        break;
    }

    let (original_name, data) = upload.ok_or_else(|| AppError::new(ErrorCode::UploadMissingFile))?;

    let file_name = generate_file_name(&extension_of(original_name.as_deref()));
    let dir = state.uploads_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::storage(format!("Failed to create uploads directory: {e}")))?;

    let path = dir.join(&file_name);
    if let Err(e) = store_new_file(&path, &data).await {
        tracing::error!(path = %path.display(), error = %e, "Failed to store upload");
        return Err(AppError::storage(format!("Failed to save file: {e}")));
    }

    tracing::info!(
        original_name = ?original_name,
        file_name = %file_name,
        size = data.len(),
        "Image uploaded"
    );

    Ok(Json(UploadResponse {
        url: format!("/uploads/{file_name}"),
    }))
}

/// GET /uploads/:filename - 读取已上传文件
pub async fn serve_uploaded_file(
    State(state): State<ServerState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    if !is_safe_file_name(&filename) {
        return Err(AppError::new(ErrorCode::UploadInvalidName));
    }

    let path = state.uploads_dir().join(&filename);
    let content = match tokio::fs::read(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::not_found(format!("Upload {filename}")));
        }
        Err(e) => return Err(AppError::storage(format!("Failed to read upload: {e}"))),
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], content).into_response())
}

//! Image uploads for the admin dashboard.
//!
//! Files are stored in `server.upload_dir` under a random name and served
//! back from `/uploads/<name>`.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::AppState;

use super::auth::Admin;
use super::error::ApiError;

/// Extensions accepted for upload. SVG is excluded since it can carry script.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Multipart framing allowance on top of the file size limit
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
    pub content_type: String,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("File is too large")
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text()))
    }
}

/// Lowercased extension of an uploaded file name, if it is an allowed image type
fn image_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Identify an image format from its leading bytes
fn sniff_image(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("gif")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// The declared extension must agree with the file contents
fn matches_contents(ext: &str, data: &[u8]) -> bool {
    match sniff_image(data) {
        Some("jpeg") => ext == "jpg" || ext == "jpeg",
        Some(kind) => ext == kind,
        None => false,
    }
}

/// Upload an image
///
/// POST /api/upload (multipart field `file`)
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut file: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        file = Some((filename, data));
    }

    let (original_name, data) =
        file.ok_or_else(|| ApiError::bad_request("Missing required 'file' field"))?;

    if data.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    if data.len() > state.config.server.max_upload_bytes {
        return Err(ApiError::payload_too_large(format!(
            "File is too large (max {} bytes)",
            state.config.server.max_upload_bytes
        )));
    }

    let ext = image_extension(&original_name).ok_or_else(|| {
        ApiError::unsupported_media_type(format!(
            "Only image uploads are allowed ({})",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;
    if !matches_contents(&ext, &data) {
        return Err(ApiError::unsupported_media_type(
            "File contents do not match an allowed image type",
        ));
    }

    let filename = format!("{}.{}", Uuid::new_v4(), ext);
    let upload_dir = &state.config.server.upload_dir;
    tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
        tracing::error!("Failed to create upload directory: {}", e);
        ApiError::internal("Failed to store file")
    })?;
    tokio::fs::write(upload_dir.join(&filename), &data)
        .await
        .map_err(|e| {
            tracing::error!("Failed to write upload {}: {}", filename, e);
            ApiError::internal("Failed to store file")
        })?;

    let content_type = mime_guess::from_ext(&ext)
        .first_or_octet_stream()
        .to_string();

    info!(
        filename = %filename,
        original = %original_name,
        size = data.len(),
        "Upload stored"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url: format!("/uploads/{}", filename),
            filename,
            size: data.len(),
            content_type,
        }),
    ))
}

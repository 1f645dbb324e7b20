/**
 * Image Routes
 * Admin image uploads for poem and blog artwork, served under /uploads
 */
use axum::{
    extract::{Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::auth::AdminAuth;

/// Directory served at `/uploads`
pub const UPLOAD_ROOT: &str = "uploads";
const IMAGE_DIR: &str = "uploads/images";
const IMAGE_URL_PREFIX: &str = "/uploads/images";
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5MB
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
    pub mime_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub filename: String,
    pub url: String,
    pub size: u64,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageListResponse {
    pub images: Vec<ImageInfo>,
    pub total: usize,
}

/// MIME type sniffed from the file header, if it is an allowed image.
fn detect_image_type(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        _ => "webp",
    }
}

fn has_allowed_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Plain file name: no separators, traversal or NUL bytes.
fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains('\0')
}

/// Checks an upload and returns its MIME type.
fn validate_upload(original_name: &str, bytes: &[u8]) -> Result<&'static str, ApiError> {
    if !has_allowed_extension(original_name) {
        return Err(ApiError::bad_request(
            "Unsupported file type. Allowed: JPEG, PNG, WebP, GIF.",
        ));
    }
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Empty file"));
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(ApiError::bad_request("File too large. Maximum size is 5MB."));
    }
    detect_image_type(bytes).ok_or_else(|| {
        ApiError::bad_request("File content does not match an allowed image type.")
    })
}

/// POST /api/admin/images (multipart, first field is the file)
pub async fn upload_image(
    _admin: AdminAuth,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            tracing::warn!("Multipart error: {}", e);
            ApiError::bad_request("Invalid multipart data")
        })?
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;

    let original_name = field.file_name().unwrap_or("unknown").to_string();
    let bytes = field.bytes().await.map_err(|e| {
        tracing::warn!("Failed to read upload bytes: {}", e);
        ApiError::bad_request("Failed to read file data")
    })?;

    let mime_type = validate_upload(&original_name, &bytes)?;

    let dir = PathBuf::from(IMAGE_DIR);
    tokio::fs::create_dir_all(&dir).await.map_err(|e| {
        tracing::error!("Failed to create upload directory: {}", e);
        ApiError::Internal("Failed to initialize upload directory".to_string())
    })?;

    let filename = format!("{}.{}", Uuid::new_v4(), extension_for(mime_type));
    tokio::fs::write(dir.join(&filename), &bytes)
        .await
        .map_err(|e| {
            tracing::error!("Failed to write upload file: {}", e);
            ApiError::Internal("Failed to save file".to_string())
        })?;

    tracing::info!("Image uploaded: {} ({} bytes)", filename, bytes.len());

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url: format!("{}/{}", IMAGE_URL_PREFIX, filename),
            filename,
            size: bytes.len(),
            mime_type: mime_type.to_string(),
        }),
    ))
}

/// DELETE /api/admin/images/{filename}
pub async fn delete_image(
    _admin: AdminAuth,
    Path(filename): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !is_safe_filename(&filename) {
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let file_path = PathBuf::from(IMAGE_DIR).join(&filename);
    match tokio::fs::remove_file(&file_path).await {
        Ok(()) => {
            tracing::info!("Image deleted: {}", filename);
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::NotFound("File not found".to_string()))
        }
        Err(e) => {
            tracing::error!("Failed to delete file {}: {}", filename, e);
            Err(ApiError::Internal("Failed to delete file".to_string()))
        }
    }
}

/// GET /api/admin/images - Newest first
pub async fn list_images(_admin: AdminAuth) -> Result<Json<ImageListResponse>, ApiError> {
    let mut entries = match tokio::fs::read_dir(IMAGE_DIR).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Json(ImageListResponse {
                images: Vec::new(),
                total: 0,
            }))
        }
        Err(e) => {
            tracing::error!("Failed to read upload directory: {}", e);
            return Err(ApiError::Internal("Failed to list images".to_string()));
        }
    };

    let mut images = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !has_allowed_extension(&filename) {
            continue;
        }

        let created_at = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339())
            .unwrap_or_default();

        images.push(ImageInfo {
            url: format!("{}/{}", IMAGE_URL_PREFIX, filename),
            filename,
            size: metadata.len(),
            created_at,
        });
    }

    images.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = images.len();
    Ok(Json(ImageListResponse { images, total }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{admin_token, send};
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{delete, get};
    use axum::Router;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_detect_image_type() {
        assert_eq!(detect_image_type(PNG_HEADER), Some("image/png"));
        assert_eq!(detect_image_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(detect_image_type(b"GIF89a"), Some("image/gif"));
        assert_eq!(detect_image_type(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(detect_image_type(b"<svg"), None);
        assert_eq!(detect_image_type(&[0xFF]), None);
    }

    #[test]
    fn test_validate_upload() {
        assert_eq!(validate_upload("dawn.PNG", PNG_HEADER).unwrap(), "image/png");
        assert!(validate_upload("dawn.svg", PNG_HEADER).is_err());
        assert!(validate_upload("dawn", PNG_HEADER).is_err());
        assert!(validate_upload("dawn.png", &[]).is_err());
        // Extension says image, content does not.
        assert!(validate_upload("dawn.png", b"<html>").is_err());

        let mut huge = PNG_HEADER.to_vec();
        huge.resize(MAX_FILE_SIZE + 1, 0);
        assert!(validate_upload("dawn.png", &huge).is_err());
    }

    #[test]
    fn test_is_safe_filename() {
        assert!(is_safe_filename("3f2a.png"));
        assert!(!is_safe_filename("../secret"));
        assert!(!is_safe_filename("a/b.png"));
        assert!(!is_safe_filename("a\\b.png"));
        assert!(!is_safe_filename(""));
    }

    #[tokio::test]
    async fn test_image_routes_require_token() {
        let app = Router::new()
            .route("/api/admin/images", get(list_images))
            .route("/api/admin/images/{filename}", delete(delete_image));

        let req = Request::get("/api/admin/images").body(Body::empty()).unwrap();
        let (status, _) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let req = Request::delete("/api/admin/images/x.png")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_missing_image_is_not_found() {
        let app = Router::new().route("/api/admin/images/{filename}", delete(delete_image));
        let req = Request::delete(format!("/api/admin/images/{}.png", Uuid::new_v4()))
            .header("authorization", format!("Bearer {}", admin_token()))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

use std::path::Path as FsPath;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/upload/image",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
        .route("/upload/image/{filename}", axum::routing::delete(delete_image))
        .route("/uploads/{filename}", get(serve_image))
}

/// Stores an advantage photo under a fresh random name and returns the
/// public URL to reference from the advantage record.
async fn upload_image(
    State(state): State<AppState>,
    _auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Malformed multipart body".to_string()))?
        .ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;

    let content_type = field.content_type().unwrap_or_default().to_string();
    let extension = extension_for(&content_type)
        .ok_or_else(|| AppError::BadRequest("Only image uploads are accepted".to_string()))?;

    let data = field
        .bytes()
        .await
        .map_err(|_| AppError::BadRequest("Failed to read upload".to_string()))?;

    if data.is_empty() {
        return Err(AppError::BadRequest("Empty upload".to_string()));
    }
    if data.len() > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest(
            "Image exceeds the 5 MiB limit".to_string(),
        ));
    }

    let filename = format!("{}.{}", Uuid::new_v4(), extension);
    tokio::fs::create_dir_all(&state.config.upload_dir).await?;
    tokio::fs::write(FsPath::new(&state.config.upload_dir).join(&filename), &data).await?;

    info!("stored upload {} ({} bytes)", filename, data.len());

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url: format!("{}/uploads/{}", state.config.public_base_url, filename),
            filename,
        }),
    ))
}

async fn serve_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let filename = sanitize_filename(&filename)?;
    let path = FsPath::new(&state.config.upload_dir).join(&filename);

    let data = tokio::fs::read(&path)
        .await
        .map_err(|_| AppError::NotFound("File".to_string()))?;

    let content_type = content_type_for(&filename);
    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

async fn delete_image(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(filename): Path<String>,
) -> Result<StatusCode, AppError> {
    let filename = sanitize_filename(&filename)?;
    let path = FsPath::new(&state.config.upload_dir).join(&filename);

    tokio::fs::remove_file(&path)
        .await
        .map_err(|_| AppError::NotFound("File".to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Uploaded names are UUIDs plus an extension, so anything else is rejected.
fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    let safe = !filename.is_empty()
        && filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
        && !filename.contains("..");

    if safe {
        Ok(filename.to_string())
    } else {
        Err(AppError::BadRequest("Invalid filename".to_string()))
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

//! # Upload Handler
//!
//! The file-upload collaborator: accepts one file per request and returns a
//! server-relative path string. The chat session treats that path as an
//! opaque attachment reference, with no further validation of content type
//! or size.

use axum::extract::{Extension, Multipart, State};
use axum::Json;
use lib_auth::Claims;
use lib_core::{AppError, Config, Result};
use shared::dto::UploadResponse;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Keep the original filename recognizable without ever trusting it as a path.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Store one uploaded file and return its server-relative path.
///
/// **Route**: `POST /api/upload` (multipart, authenticated)
///
/// The file is written under the configured upload directory with a
/// uuid-prefixed name, so uploads can never collide or overwrite each other.
pub async fn upload_file(
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart request: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original = field
            .file_name()
            .map(sanitize_filename)
            .unwrap_or_else(|| "upload".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?;

        if data.is_empty() {
            return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
        }

        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {}", e)))?;

        let stored_name = format!("{}-{}", Uuid::new_v4(), original);
        let dest = Path::new(&config.upload_dir).join(&stored_name);

        tokio::fs::write(&dest, &data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

        info!(
            user = %claims.username,
            file = %stored_name,
            size = data.len(),
            "[UPLOAD] file stored"
        );

        return Ok(Json(UploadResponse {
            file_path: format!("/uploads/{}", stored_name),
        }));
    }

    warn!(user = %claims.username, "[UPLOAD] request without a file field");
    Err(AppError::InvalidInput("No file field in upload".to_string()))
}

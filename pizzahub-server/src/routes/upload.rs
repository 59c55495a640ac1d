//! Image uploads for menu items

use std::path::Path;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::header::HOST;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::crypto::random_suffix;
use crate::email::EmailSender;
use crate::error::ApiError;
use crate::state::{AppState, UploadSettings};
use crate::store::{CatalogStore, OrderStore, UserStore};

/// Multipart field carrying the file
const IMAGE_FIELD: &str = "image";

/// Request body cap for uploads, above axum's 2 MB default
pub(super) const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: String,
}

/// `image-<millis>-<random><.ext>`, keeping only a plain extension
fn stored_file_name(original: Option<&str>) -> String {
    let ext = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!(
        "{}-{}-{}{}",
        IMAGE_FIELD,
        Utc::now().timestamp_millis(),
        random_suffix(),
        ext
    )
}

fn public_url(settings: &UploadSettings, headers: &HeaderMap, file_name: &str) -> String {
    let base = match &settings.public_base_url {
        Some(base) => base.clone(),
        None => {
            let host = headers
                .get(HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("localhost");
            format!("http://{}", host)
        }
    };

    format!("{}/uploads/{}", base, file_name)
}

fn bad_upload(e: impl std::fmt::Display) -> ApiError {
    ApiError::Validation(format!("Invalid upload: {}", e))
}

/// POST /api/admin/upload
pub async fn upload_image<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = stored_file_name(field.file_name());
        let data = field.bytes().await.map_err(bad_upload)?;

        let dir = &state.uploads.dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ApiError::Storage(format!("Failed to create uploads dir: {}", e)))?;
        tokio::fs::write(dir.join(&file_name), &data)
            .await
            .map_err(|e| ApiError::Storage(format!("Failed to write upload: {}", e)))?;

        tracing::info!(file = %file_name, bytes = data.len(), "Image uploaded");

        return Ok(Json(UploadResponse {
            image_url: public_url(&state.uploads, &headers, &file_name),
        }));
    }

    Err(ApiError::Validation("No file uploaded".to_string()))
}

// Media upload endpoint: multipart photo/video attachments for an
// experience owned by the caller.

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::infrastructure::media_storage::MAX_MEDIA_BYTES;
use crate::infrastructure::middleware::ViewerContext;
use crate::models::{ExperienceMedia, MediaType};

struct UploadedFile {
    filename: String,
    content_type: String,
    bytes: axum::body::Bytes,
}

pub async fn upload_media(
    State(state): State<AppState>,
    Extension(viewer): Extension<ViewerContext>,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let mut file: Option<UploadedFile> = None;
    let mut experience_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read uploaded file: {}", e))
                })?;
                file = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes,
                });
            }
            Some("experienceId") => {
                let value = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Invalid experience ID field: {}", e))
                })?;
                experience_id = Some(value);
            }
            _ => {}
        }
    }

    let (file, experience_id) = match (file, experience_id) {
        (Some(f), Some(id)) if !id.is_empty() => (f, id),
        _ => {
            return Err(AppError::Validation(
                "File and experience ID are required".to_string(),
            ));
        }
    };

    // Ownership check collapses to the same 404 as absence.
    match state.db.get_experience(&experience_id).await? {
        Some(experience) if experience.user_id == viewer.user_id => {}
        _ => {
            return Err(AppError::NotFound(
                "Experience not found or unauthorized".to_string(),
            ));
        }
    }

    let is_image = file.content_type.starts_with("image/");
    let is_video = file.content_type.starts_with("video/");
    if !is_image && !is_video {
        return Err(AppError::Validation(
            "Only image and video files are allowed".to_string(),
        ));
    }
    if file.bytes.len() > MAX_MEDIA_BYTES {
        return Err(AppError::Validation(
            "File size must be less than 50MB".to_string(),
        ));
    }

    let url = state.storage.store(&file.filename, &file.bytes).await?;

    let media = ExperienceMedia {
        id: Uuid::new_v4().to_string(),
        experience_id,
        media_type: if is_image {
            MediaType::Photo
        } else {
            MediaType::Video
        },
        media_url: url.clone(),
        caption: None,
        created_at: Utc::now(),
    };
    state.db.insert_media(&media).await?;
    info!(
        "User {} attached {} to experience {}",
        viewer.user_id,
        media.media_type.as_str(),
        media.experience_id
    );

    Ok(Json(json!({ "success": true, "media": media, "url": url })))
}

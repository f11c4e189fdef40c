// Experience endpoints: creation, update, deletion, the owner's profile
// listing, and the friends feed.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::infrastructure::middleware::ViewerContext;
use crate::models::ExperienceInput;

pub async fn create_experience(
    State(state): State<AppState>,
    Extension(viewer): Extension<ViewerContext>,
    Json(input): Json<ExperienceInput>,
) -> AppResult<Json<Value>> {
    let experience = state.experiences.create(&viewer, &input).await?;
    info!(
        "User {} logged experience {} (rating {})",
        viewer.user_id, experience.id, experience.rating
    );
    Ok(Json(json!({ "success": true, "experience": experience })))
}

pub async fn update_experience(
    State(state): State<AppState>,
    Extension(viewer): Extension<ViewerContext>,
    Path(id): Path<String>,
    Json(input): Json<ExperienceInput>,
) -> AppResult<Json<Value>> {
    let experience = state.experiences.update(&viewer, &id, &input).await?;
    Ok(Json(json!({ "success": true, "experience": experience })))
}

pub async fn delete_experience(
    State(state): State<AppState>,
    Extension(viewer): Extension<ViewerContext>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    state.experiences.delete(&viewer, &id).await?;
    info!("User {} deleted experience {}", viewer.user_id, id);
    Ok(Json(json!({
        "success": true,
        "message": "Experience deleted successfully"
    })))
}

pub async fn user_experiences(
    State(state): State<AppState>,
    Extension(viewer): Extension<ViewerContext>,
) -> AppResult<Json<Value>> {
    let (experiences, stats) = state.experiences.list_own(&viewer).await?;
    Ok(Json(json!({ "experiences": experiences, "stats": stats })))
}

pub async fn feed(
    State(state): State<AppState>,
    Extension(viewer): Extension<ViewerContext>,
) -> AppResult<Json<Value>> {
    let experiences = state.feed.feed_for(&viewer).await?;
    Ok(Json(json!({ "experiences": experiences })))
}

// Friend endpoints: listing, sending requests, responding to requests.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::infrastructure::middleware::ViewerContext;

#[derive(Debug, Deserialize)]
pub struct FriendRequestBody {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRespondBody {
    pub friendship_id: Option<String>,
    pub action: Option<String>,
}

pub async fn list_friends(
    State(state): State<AppState>,
    Extension(viewer): Extension<ViewerContext>,
) -> AppResult<Json<Value>> {
    let friends = state.friendships.list_friends(&viewer).await?;
    Ok(Json(json!({ "friends": friends })))
}

pub async fn send_friend_request(
    State(state): State<AppState>,
    Extension(viewer): Extension<ViewerContext>,
    Json(body): Json<FriendRequestBody>,
) -> AppResult<Json<Value>> {
    let email = body
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;

    let friendship = state.friendships.send_request(&viewer, email).await?;
    info!(
        "User {} sent a friend request to {}",
        viewer.user_id, friendship.addressee_id
    );
    Ok(Json(json!({ "success": true, "friendship": friendship })))
}

pub async fn respond_friend_request(
    State(state): State<AppState>,
    Extension(viewer): Extension<ViewerContext>,
    Json(body): Json<FriendRespondBody>,
) -> AppResult<Json<Value>> {
    let (friendship_id, action) = match (body.friendship_id.as_deref(), body.action.as_deref()) {
        (Some(id), Some(action)) if !id.is_empty() && !action.is_empty() => (id, action),
        _ => {
            return Err(AppError::Validation(
                "Friendship ID and action are required".to_string(),
            ));
        }
    };

    let friendship = state
        .friendships
        .respond(&viewer, friendship_id, action)
        .await?;
    info!(
        "User {} responded '{}' to friend request {}",
        viewer.user_id, action, friendship_id
    );
    Ok(Json(json!({ "success": true, "friendship": friendship })))
}

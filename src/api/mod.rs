// HTTP surface: router assembly, auth middleware wiring, and the health
// endpoint. Handlers live in the sibling modules.

pub mod experiences;
pub mod friends;
pub mod media;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::app_state::AppState;
use crate::infrastructure::media_storage::MAX_MEDIA_BYTES;
use crate::infrastructure::middleware::viewer_context_middleware;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/experiences", post(experiences::create_experience))
        .route("/experiences/user", get(experiences::user_experiences))
        .route("/experiences/feed", get(experiences::feed))
        .route("/experiences/media", post(media::upload_media))
        .route(
            "/experiences/{id}",
            patch(experiences::update_experience).delete(experiences::delete_experience),
        )
        .route("/friends", get(friends::list_friends))
        .route("/friends/request", post(friends::send_friend_request))
        .route("/friends/respond", post(friends::respond_friend_request))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            viewer_context_middleware::<AppState>,
        ))
        // Leave headroom over the 50 MB media cap so oversized uploads
        // reach the handler's own validation.
        .layer(DefaultBodyLimit::max(MAX_MEDIA_BYTES + 4 * 1024 * 1024));

    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api", api)
        .nest_service("/media", ServeDir::new(&state.config.media.root))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "Away Days API",
        "timestamp": Utc::now()
    }))
}

// Viewer context middleware - resolves the session token into a
// request-scoped identity injected into request extensions. Handlers and
// services never read ambient auth state.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::Database;

/// The authenticated identity a request acts as.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

/// Trait for application state that exposes the database.
pub trait HasDatabase {
    fn database(&self) -> &Arc<Database>;
}

/// Rejects the request with 401 unless a live session token is presented.
pub async fn viewer_context_middleware<T>(
    State(app_state): State<T>,
    mut request: Request,
    next: Next,
) -> AppResult<Response>
where
    T: HasDatabase + Clone + Send + Sync + 'static,
{
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

    let user = app_state
        .database()
        .session_user(&token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

    request.extensions_mut().insert(ViewerContext {
        user_id: user.id,
        name: user.name,
        email: user.email,
    });

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("authorization")?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer tok-123"));
        assert_eq!(extract_bearer_token(&headers), Some("tok-123".to_string()));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}

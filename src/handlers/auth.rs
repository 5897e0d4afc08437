//! Authentication handlers
//!
//! Implements login, logout, and current session endpoints for the single
//! administrator account configured in `[admin]`.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::middleware::auth::{SESSION_TIMESTAMP_KEY, SESSION_USER_KEY};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Current session response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Check credentials against the configured administrator
fn verify_admin(state: &AppState, req: &LoginRequest) -> bool {
    let admin = &state.config.admin;
    if admin.password_hash.is_empty() {
        tracing::warn!("Login attempted but no admin password hash is configured");
        return false;
    }
    if req.username != admin.username {
        return false;
    }
    bcrypt::verify(&req.password, &admin.password_hash).unwrap_or(false)
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    if req.username.is_empty() || req.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "bad request"})),
        );
    }

    if !verify_admin(&state, &req) {
        tracing::warn!("Login failed for {}", req.username);
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "username or password error"})),
        );
    }

    if let Err(e) = session.insert(SESSION_USER_KEY, &req.username).await {
        tracing::error!("Failed to save session: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "internal error"})),
        );
    }
    if let Err(e) = session
        .insert(SESSION_TIMESTAMP_KEY, chrono::Utc::now().timestamp())
        .await
    {
        tracing::error!("Failed to save session timestamp: {}", e);
    }

    tracing::info!("Administrator logged in: {}", req.username);
    (
        StatusCode::OK,
        Json(serde_json::json!({"message": "login success"})),
    )
}

/// POST /api/logout
pub async fn logout(session: Session) -> impl IntoResponse {
    let username: Option<String> = session.get(SESSION_USER_KEY).await.unwrap_or(None);

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::error(500, "internal error")),
        );
    }

    if let Some(username) = username {
        tracing::info!("Administrator logged out: {}", username);
    }
    (
        StatusCode::OK,
        Json(ApiResponse::success_msg("logout success")),
    )
}

/// GET /api/session
pub async fn current_session(session: Session) -> Json<SessionResponse> {
    let username: Option<String> = session.get(SESSION_USER_KEY).await.unwrap_or(None);
    Json(SessionResponse {
        logged_in: username.is_some(),
        username,
    })
}

//! Authentication middleware
//!
//! A single administrator session gates every mutating API route. Browsing
//! cabinets, scanning labels and unlocking confidential items stay public.

use axum::{
    body::Body,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::error::AppError;

/// Session key for storing username
pub const SESSION_USER_KEY: &str = "user";
pub const SESSION_TIMESTAMP_KEY: &str = "timestamp";

/// Extension present on requests of a logged in administrator
#[derive(Clone, Debug)]
pub struct AdminSession {
    pub username: String,
}

/// Routes that don't require authentication
fn is_public_route(method: &Method, path: &str) -> bool {
    // All non-API routes are static files
    let Some(rest) = path.strip_prefix("/api") else {
        return true;
    };
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    let is_get = *method == Method::GET;
    match segments.as_slice() {
        ["health"] | ["config"] | ["login"] | ["logout"] | ["session"] | ["ws"] => true,
        ["cabinets"]
        | ["cabinets", _]
        | ["cabinets", _, "grid" | "sheets"]
        | ["items", _]
        | ["items", _, "qr"]
        | ["file-types"] => is_get,
        ["items", _, "unlock"] => *method == Method::POST,
        _ => false,
    }
}

/// Authentication middleware
pub async fn auth_layer(session: Session, mut request: Request<Body>, next: Next) -> Response {
    let username: Option<String> = session.get(SESSION_USER_KEY).await.unwrap_or(None);

    if let Some(username) = username {
        request.extensions_mut().insert(AdminSession { username });
        return next.run(request).await;
    }

    if is_public_route(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    tracing::debug!(
        "Rejected unauthenticated {} {}",
        request.method(),
        request.uri().path()
    );
    AppError::Unauthorized.into_response()
}

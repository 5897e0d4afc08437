use axum::{
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::handlers;
use crate::middleware::auth_layer;
use crate::state::AppState;
use crate::ws;

pub mod health;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: true,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(_code: i32, message: impl Into<String>) -> Self {
        Self {
            code: false,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // Session store (in-memory for now)
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_http_only(true);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth routes
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/session", get(handlers::auth::current_session))
        // Config routes
        .route("/config", get(handlers::config::get_config))
        // Cabinet routes
        .route(
            "/cabinets",
            get(handlers::cabinet::list_cabinets).post(handlers::cabinet::create_cabinet),
        )
        .route(
            "/cabinets/:id",
            get(handlers::cabinet::get_cabinet)
                .put(handlers::cabinet::update_cabinet)
                .delete(handlers::cabinet::delete_cabinet),
        )
        .route("/cabinets/:id/grid", get(handlers::cabinet::get_grid))
        .route("/cabinets/:id/sheets", get(handlers::cabinet::get_sheets))
        .route("/cabinets/:id/defaults", get(handlers::cabinet::get_defaults))
        .route("/cabinets/:id/choices", get(handlers::cabinet::get_choices))
        // Item routes
        .route("/items", get(handlers::item::search_items))
        .route("/items/:id", get(handlers::item::get_item))
        .route("/items/:id/unlock", post(handlers::item::unlock_item))
        .route("/items/:id/qr", get(handlers::item::get_qr))
        .route("/items/:id/move", post(handlers::item::move_to))
        // File routes
        .route("/files", post(handlers::item::create_file))
        .route(
            "/files/:id",
            put(handlers::item::update_file).delete(handlers::item::delete_file),
        )
        // Document routes
        .route("/documents", post(handlers::item::create_document))
        .route(
            "/documents/:id",
            put(handlers::item::update_document)
                .delete(handlers::item::delete_document),
        )
        // File type routes
        .route(
            "/file-types",
            get(handlers::file_type::list_file_types).post(handlers::file_type::create_file_type),
        )
        .route("/file-types/grouped", get(handlers::file_type::grouped_files))
        .route(
            "/file-types/:id",
            put(handlers::file_type::update_file_type)
                .delete(handlers::file_type::delete_file_type),
        )
        // Label routes
        .route("/labels", post(handlers::label::build_labels))
        // WebSocket
        .route("/ws", get(ws::serve_ws))
        .fallback(fallback);

    // Static file service for frontend
    // Falls back to index.html for SPA routing
    let index_file = state.config.static_dir.join("index.html");
    let serve_dir = ServeDir::new(&state.config.static_dir)
        .not_found_service(ServeFile::new(index_file));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(serve_dir)
        .layer(middleware::from_fn(auth_layer))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for 404
pub async fn fallback() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(404, "Not Found")),
    )
}

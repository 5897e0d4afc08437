//! Configuration handlers
//!
//! Returns public configuration settings to the frontend

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::state::AppState;

/// Public configuration response
#[derive(Debug, Serialize)]
pub struct PublicConfig {
    /// Origin embedded in QR links
    #[serde(rename = "publicOrigin")]
    pub public_origin: String,
    /// Route prefix between origin and path in QR links
    #[serde(rename = "linkPrefix")]
    pub link_prefix: String,
}

/// GET /api/config
/// Returns public configuration settings
pub async fn get_config(State(state): State<AppState>) -> Json<PublicConfig> {
    Json(PublicConfig {
        public_origin: state.config.public_origin.clone(),
        link_prefix: state.config.link_prefix.clone(),
    })
}

//! Label sheet handler

use axum::{extract::State, response::Json};
use serde::Deserialize;

use crate::catalog::find_item;
use crate::error::{AppError, AppResult};
use crate::location::{build_label, LabelCard, LabelOptions};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Label sheet request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRequest {
    pub item_ids: Vec<String>,
    #[serde(default)]
    pub options: LabelOptions,
}

/// POST /api/labels
///
/// Unknown ids are skipped; the sheet keeps the requested order.
pub async fn build_labels(
    State(state): State<AppState>,
    Json(req): Json<LabelRequest>,
) -> AppResult<Json<ApiResponse<Vec<LabelCard>>>> {
    if req.item_ids.is_empty() {
        return Err(AppError::BadRequest("no items selected".to_string()));
    }

    let snapshot = state.store.snapshot().await;
    let printed_on = chrono::Local::now().date_naive();

    let mut cards = Vec::with_capacity(req.item_ids.len());
    for id in &req.item_ids {
        let Some(item) = find_item(&snapshot, id) else {
            tracing::debug!("Skipping label for unknown item {}", id);
            continue;
        };
        let cabinet = snapshot.cabinet(&item.location.cabinet_id);
        cards.push(build_label(
            &item,
            cabinet,
            &req.options,
            &state.links,
            printed_on,
        ));
    }

    tracing::info!("Built {} labels", cards.len());
    Ok(Json(ApiResponse::success(cards)))
}

//! Cabinet handlers
//!
//! Dashboard summaries, grid and print views, and cabinet CRUD. Every saved
//! cabinet is normalized and must produce a layout.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::catalog::{collect_items, items_in_cabinet};
use crate::entity::Cabinet;
use crate::error::{AppResult, OptionExt};
use crate::grid::{build_grid, column_sheets, summarize, CabinetGrid, CabinetSummary, CellSheet};
use crate::layout::{validate_cabinet, Cell, Layout};
use crate::placement::{derive_default_placement, placement_choices, PlacementDefaults};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Cabinet record with its computed layout
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CabinetDetail {
    pub id: String,
    #[serde(flatten)]
    pub cabinet: Cabinet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    /// Why no layout could be computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_error: Option<String>,
    pub link: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoicesQuery {
    #[serde(default)]
    pub lockers_only: bool,
}

/// Normalize and validate a cabinet before it is written
fn prepare(mut cabinet: Cabinet) -> AppResult<Cabinet> {
    cabinet.normalize();
    validate_cabinet(&cabinet)?;
    Ok(cabinet)
}

/// GET /api/cabinets
pub async fn list_cabinets(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<CabinetSummary>>>> {
    let snapshot = state.store.snapshot().await;
    let items = collect_items(&snapshot);
    Ok(Json(ApiResponse::success(summarize(
        &snapshot.cabinets,
        &items,
    ))))
}

/// GET /api/cabinets/:id
pub async fn get_cabinet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<CabinetDetail>>> {
    let snapshot = state.store.snapshot().await;
    let cabinet = snapshot
        .cabinet(&id)
        .ok_or_not_found(format!("Cabinet {} not found", id))?;

    let (layout, layout_error) = match state.layout(cabinet) {
        Ok(layout) => (Some(Layout::clone(&layout)), None),
        Err(e) => {
            tracing::warn!("Cabinet {} has no valid layout: {}", id, e);
            (None, Some(e.to_string()))
        }
    };

    Ok(Json(ApiResponse::success(CabinetDetail {
        link: state.links.cabinet_link(&id),
        id,
        cabinet: cabinet.clone(),
        layout,
        layout_error,
    })))
}

async fn grid_for(state: &AppState, id: &str) -> AppResult<CabinetGrid> {
    let snapshot = state.store.snapshot().await;
    let cabinet = snapshot
        .cabinet(id)
        .ok_or_not_found(format!("Cabinet {} not found", id))?;
    let layout = state.layout(cabinet)?;
    let items = collect_items(&snapshot);
    Ok(build_grid(cabinet, &layout, items_in_cabinet(&items, id)))
}

/// GET /api/cabinets/:id/grid
pub async fn get_grid(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<CabinetGrid>>> {
    let grid = grid_for(&state, &id).await?;
    Ok(Json(ApiResponse::success(grid)))
}

/// GET /api/cabinets/:id/sheets
pub async fn get_sheets(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<CellSheet>>>> {
    let grid = grid_for(&state, &id).await?;
    Ok(Json(ApiResponse::success(column_sheets(&grid))))
}

/// GET /api/cabinets/:id/defaults
pub async fn get_defaults(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<PlacementDefaults>>> {
    let snapshot = state.store.snapshot().await;
    let cabinet = snapshot
        .cabinet(&id)
        .ok_or_not_found(format!("Cabinet {} not found", id))?;
    Ok(Json(ApiResponse::success(derive_default_placement(cabinet))))
}

/// GET /api/cabinets/:id/choices
pub async fn get_choices(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ChoicesQuery>,
) -> AppResult<Json<ApiResponse<Vec<Cell>>>> {
    let snapshot = state.store.snapshot().await;
    let cabinet = snapshot
        .cabinet(&id)
        .ok_or_not_found(format!("Cabinet {} not found", id))?;
    let layout = state.layout(cabinet)?;
    Ok(Json(ApiResponse::success(placement_choices(
        &layout,
        query.lockers_only,
    ))))
}

/// POST /api/cabinets
pub async fn create_cabinet(
    State(state): State<AppState>,
    Json(cabinet): Json<Cabinet>,
) -> AppResult<Json<ApiResponse<CreatedResponse>>> {
    let cabinet = prepare(cabinet)?;
    let name = cabinet.name.clone();
    let id = state.store.insert(cabinet).await?;
    tracing::info!("Created cabinet {} ({})", id, name);
    Ok(Json(ApiResponse::success(CreatedResponse { id })))
}

/// PUT /api/cabinets/:id
pub async fn update_cabinet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(cabinet): Json<Cabinet>,
) -> AppResult<Json<ApiResponse<()>>> {
    let snapshot = state.store.snapshot().await;
    snapshot
        .cabinet(&id)
        .ok_or_not_found(format!("Cabinet {} not found", id))?;

    let cabinet = prepare(cabinet)?;
    state.store.put(&id, cabinet).await?;
    tracing::info!("Updated cabinet {}", id);
    Ok(Json(ApiResponse::success_msg("cabinet updated")))
}

/// DELETE /api/cabinets/:id
///
/// Items keep their now dangling cabinet reference.
pub async fn delete_cabinet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .store
        .remove::<Cabinet>(&id)
        .await?
        .ok_or_not_found(format!("Cabinet {} not found", id))?;
    tracing::info!("Deleted cabinet {}", id);
    Ok(Json(ApiResponse::success_msg("cabinet deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::LockerDecl;
    use crate::error::{AppError, InvalidCabinetError};

    #[test]
    fn test_prepare_normalizes() {
        let cabinet = Cabinet::new("A", 2, 3)
            .with_level_columns(1, 3)
            .with_locker(LockerDecl::whole_level(2))
            .with_locker(LockerDecl::whole_level(2));
        let prepared = prepare(cabinet).unwrap();
        assert!(prepared.level_columns.is_empty());
        assert_eq!(prepared.lockers.len(), 1);
        assert!(prepared.has_locker);
    }

    #[test]
    fn test_prepare_rejects_invalid_counts() {
        assert!(matches!(
            prepare(Cabinet::new("A", 0, 3)),
            Err(AppError::InvalidCabinet(_))
        ));
        assert!(matches!(
            prepare(Cabinet::new("A", 2, 3).with_level_columns(2, 0)),
            Err(AppError::InvalidCabinet(_))
        ));
        assert!(matches!(
            prepare(Cabinet::new("A", 1, 1_000_000_000)),
            Err(AppError::InvalidCabinet(InvalidCabinetError::TooLarge { .. }))
        ));
    }
}

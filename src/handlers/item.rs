//! Item handlers
//!
//! Files and documents: search, the public item view reached from a scanned
//! label, unlocking confidential items, moves and CRUD.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::catalog::{collect_items, find_item, search};
use crate::entity::{DocumentRecord, FileRecord, ItemKind, StorageItem};
use crate::error::{AppError, AppResult, OptionExt};
use crate::location::{build_qr_payload, cabinet_name, format_location, placement_for, unlock};
use crate::placement::{check_target, move_item, placement_from_file_type, MoveTarget, ResolvedPlacement, TargetCheck};
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::store::Snapshot;

use super::cabinet::CreatedResponse;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub password: String,
}

/// Search result row
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRow {
    #[serde(flatten)]
    pub item: StorageItem,
    pub cabinet_name: String,
    pub location: String,
}

/// Everything shown about an open item
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetails {
    #[serde(flatten)]
    pub item: StorageItem,
    pub cabinet_name: String,
    pub placement: ResolvedPlacement,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type_name: Option<String>,
    pub qr_payload: String,
}

/// Item view, redacted until a confidential item is unlocked
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ItemView {
    #[serde(rename_all = "camelCase")]
    Locked {
        id: String,
        kind: ItemKind,
        link: String,
    },
    Open(Box<ItemDetails>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrResponse {
    pub payload: String,
}

fn details(state: &AppState, snapshot: &Snapshot, item: StorageItem) -> ItemDetails {
    let cabinet = snapshot.cabinet(&item.location.cabinet_id);
    let placement = placement_for(&item, cabinet);
    let file_type_name = item
        .file_type_id
        .as_deref()
        .and_then(|id| snapshot.file_type(id))
        .map(|t| t.name.clone());
    ItemDetails {
        qr_payload: build_qr_payload(&item, cabinet, &placement, &state.links),
        cabinet_name: cabinet_name(cabinet).to_string(),
        location: format_location(&placement),
        placement,
        file_type_name,
        item,
    }
}

/// Confidential items need a password, others never keep one
fn check_confidential(is_confidential: bool, password: &mut Option<String>) -> AppResult<()> {
    if !is_confidential {
        *password = None;
        return Ok(());
    }
    match password.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => Ok(()),
        _ => Err(AppError::Validation(
            "a confidential item requires a password".to_string(),
        )),
    }
}

/// Apply the file type's location template to a file without a cabinet
fn apply_file_type_template(snapshot: &Snapshot, file: FileRecord) -> FileRecord {
    if !file.location.cabinet_id.is_empty() || file.file_type_id.is_empty() {
        return file;
    }
    match snapshot
        .file_type(&file.file_type_id)
        .and_then(placement_from_file_type)
    {
        Some(target) => {
            tracing::debug!(
                "Placing file from type {} into cabinet {}",
                file.file_type_id,
                target.cabinet_id
            );
            move_item(file, &target)
        }
        None => file,
    }
}

/// GET /api/items?q=
pub async fn search_items(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<ItemRow>>>> {
    let snapshot = state.store.snapshot().await;
    let items = collect_items(&snapshot);
    let rows = search(&items, &query.q)
        .into_iter()
        .map(|item| {
            let cabinet = snapshot.cabinet(&item.location.cabinet_id);
            ItemRow {
                cabinet_name: cabinet_name(cabinet).to_string(),
                location: format_location(&placement_for(item, cabinet)),
                item: item.clone(),
            }
        })
        .collect();
    Ok(Json(ApiResponse::success(rows)))
}

/// GET /api/items/:id
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ItemView>>> {
    let snapshot = state.store.snapshot().await;
    let item = find_item(&snapshot, &id).ok_or_not_found(format!("Item {} not found", id))?;

    let view = if item.is_confidential {
        ItemView::Locked {
            link: state.links.item_link(&item.id),
            id: item.id,
            kind: item.kind,
        }
    } else {
        ItemView::Open(Box::new(details(&state, &snapshot, item)))
    };
    Ok(Json(ApiResponse::success(view)))
}

/// POST /api/items/:id/unlock
pub async fn unlock_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UnlockRequest>,
) -> AppResult<Json<ApiResponse<ItemView>>> {
    let snapshot = state.store.snapshot().await;
    let item = find_item(&snapshot, &id).ok_or_not_found(format!("Item {} not found", id))?;

    if !unlock(&item, &req.password) {
        tracing::warn!("Wrong password for item {}", id);
        return Err(AppError::BadRequest("incorrect password".to_string()));
    }
    Ok(Json(ApiResponse::success(ItemView::Open(Box::new(
        details(&state, &snapshot, item),
    )))))
}

/// GET /api/items/:id/qr
pub async fn get_qr(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<QrResponse>>> {
    let snapshot = state.store.snapshot().await;
    let item = find_item(&snapshot, &id).ok_or_not_found(format!("Item {} not found", id))?;
    let cabinet = snapshot.cabinet(&item.location.cabinet_id);
    let placement = placement_for(&item, cabinet);
    Ok(Json(ApiResponse::success(QrResponse {
        payload: build_qr_payload(&item, cabinet, &placement, &state.links),
    })))
}

/// POST /api/items/:id/move
pub async fn move_to(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(target): Json<MoveTarget>,
) -> AppResult<Json<ApiResponse<StorageItem>>> {
    let snapshot = state.store.snapshot().await;
    let check = check_target(snapshot.cabinet(&target.cabinet_id), &target);
    if check != TargetCheck::Valid {
        tracing::warn!(
            "Moving item {} to unchecked target {:?}: {:?}",
            id,
            target,
            check
        );
    }

    let moved = state
        .store
        .move_item(&id, &target)
        .await?
        .ok_or_not_found(format!("Item {} not found", id))?;
    tracing::info!(
        "Moved item {} to cabinet {} L{} C{}",
        id,
        target.cabinet_id,
        target.level,
        target.column
    );
    Ok(Json(ApiResponse::success(moved)))
}

/// POST /api/files
pub async fn create_file(
    State(state): State<AppState>,
    Json(mut file): Json<FileRecord>,
) -> AppResult<Json<ApiResponse<CreatedResponse>>> {
    check_confidential(file.is_confidential, &mut file.password)?;
    let snapshot = state.store.snapshot().await;
    let file = apply_file_type_template(&snapshot, file);
    let id = state.store.insert(file).await?;
    tracing::info!("Created file {}", id);
    Ok(Json(ApiResponse::success(CreatedResponse { id })))
}

/// PUT /api/files/:id
pub async fn update_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut file): Json<FileRecord>,
) -> AppResult<Json<ApiResponse<()>>> {
    let snapshot = state.store.snapshot().await;
    snapshot
        .files
        .get(&id)
        .ok_or_not_found(format!("File {} not found", id))?;
    check_confidential(file.is_confidential, &mut file.password)?;

    state.store.put(&id, file).await?;
    tracing::info!("Updated file {}", id);
    Ok(Json(ApiResponse::success_msg("file updated")))
}

/// DELETE /api/files/:id
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .store
        .remove::<FileRecord>(&id)
        .await?
        .ok_or_not_found(format!("File {} not found", id))?;
    tracing::info!("Deleted file {}", id);
    Ok(Json(ApiResponse::success_msg("file deleted")))
}

/// POST /api/documents
pub async fn create_document(
    State(state): State<AppState>,
    Json(mut document): Json<DocumentRecord>,
) -> AppResult<Json<ApiResponse<CreatedResponse>>> {
    check_confidential(document.is_confidential, &mut document.password)?;
    let id = state.store.insert(document).await?;
    tracing::info!("Created document {}", id);
    Ok(Json(ApiResponse::success(CreatedResponse { id })))
}

/// PUT /api/documents/:id
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut document): Json<DocumentRecord>,
) -> AppResult<Json<ApiResponse<()>>> {
    let snapshot = state.store.snapshot().await;
    snapshot
        .documents
        .get(&id)
        .ok_or_not_found(format!("Document {} not found", id))?;
    check_confidential(document.is_confidential, &mut document.password)?;

    state.store.put(&id, document).await?;
    tracing::info!("Updated document {}", id);
    Ok(Json(ApiResponse::success_msg("document updated")))
}

/// DELETE /api/documents/:id
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .store
        .remove::<DocumentRecord>(&id)
        .await?
        .ok_or_not_found(format!("Document {} not found", id))?;
    tracing::info!("Deleted document {}", id);
    Ok(Json(ApiResponse::success_msg("document deleted")))
}

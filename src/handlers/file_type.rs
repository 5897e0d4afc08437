//! File type handlers

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;

use crate::catalog::{group_by_file_type, GroupedFiles};
use crate::entity::FileType;
use crate::error::{AppError, AppResult, OptionExt};
use crate::routes::ApiResponse;
use crate::state::AppState;

use super::cabinet::CreatedResponse;

/// File type with its collection key
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTypeResponse {
    pub id: String,
    #[serde(flatten)]
    pub file_type: FileType,
}

fn validate(file_type: &mut FileType) -> AppResult<()> {
    file_type.name = file_type.name.trim().to_string();
    if file_type.name.is_empty() {
        return Err(AppError::Validation("file type name is required".to_string()));
    }
    Ok(())
}

/// GET /api/file-types
pub async fn list_file_types(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<FileTypeResponse>>>> {
    let snapshot = state.store.snapshot().await;
    let mut types: Vec<FileTypeResponse> = snapshot
        .file_types
        .iter()
        .map(|(id, file_type)| FileTypeResponse {
            id: id.clone(),
            file_type: file_type.clone(),
        })
        .collect();
    types.sort_by(|a, b| a.file_type.name.cmp(&b.file_type.name));
    Ok(Json(ApiResponse::success(types)))
}

/// GET /api/file-types/grouped
pub async fn grouped_files(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<GroupedFiles>>> {
    let snapshot = state.store.snapshot().await;
    Ok(Json(ApiResponse::success(group_by_file_type(&snapshot))))
}

/// POST /api/file-types
pub async fn create_file_type(
    State(state): State<AppState>,
    Json(mut file_type): Json<FileType>,
) -> AppResult<Json<ApiResponse<CreatedResponse>>> {
    validate(&mut file_type)?;
    let id = state.store.insert(file_type).await?;
    tracing::info!("Created file type {}", id);
    Ok(Json(ApiResponse::success(CreatedResponse { id })))
}

/// PUT /api/file-types/:id
pub async fn update_file_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut file_type): Json<FileType>,
) -> AppResult<Json<ApiResponse<()>>> {
    let snapshot = state.store.snapshot().await;
    snapshot
        .file_type(&id)
        .ok_or_not_found(format!("File type {} not found", id))?;
    validate(&mut file_type)?;

    state.store.put(&id, file_type).await?;
    tracing::info!("Updated file type {}", id);
    Ok(Json(ApiResponse::success_msg("file type updated")))
}

/// DELETE /api/file-types/:id
///
/// Files of the type become uncategorized.
pub async fn delete_file_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .store
        .remove::<FileType>(&id)
        .await?
        .ok_or_not_found(format!("File type {} not found", id))?;
    tracing::info!("Deleted file type {}", id);
    Ok(Json(ApiResponse::success_msg("file type deleted")))
}

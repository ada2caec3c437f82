use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    Extension,
};
use serde_json::{Map, Value};

use crate::database::Record;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, DataEnvelope};
use crate::state::AppState;

/// PUT /api/worklogs/:id - Merge the body over the stored worklog
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<DataEnvelope<Record>> {
    let Json(patch) = payload?;

    let updated = state.worklogs.update(&user.id, &id, patch).await?;
    Ok(ApiResponse::success(DataEnvelope::with_message(
        "Worklog updated",
        updated,
    )))
}

/// DELETE /api/worklogs/:id - Remove the row and echo what it held
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<DataEnvelope<Record>> {
    let deleted = state.worklogs.delete(&user.id, &id).await?;
    Ok(ApiResponse::success(DataEnvelope::with_message(
        "Worklog deleted",
        deleted,
    )))
}

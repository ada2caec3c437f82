use axum::{
    extract::{rejection::JsonRejection, Json, State},
    Extension,
};
use serde_json::{Map, Value};

use crate::database::Record;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, DataEnvelope};
use crate::state::AppState;

/// GET /api/worklogs - The caller's worklogs, newest date first
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<DataEnvelope<Vec<Record>>> {
    let logs = state.worklogs.list(&user.id).await?;
    Ok(ApiResponse::success(DataEnvelope::new(logs)))
}

/// POST /api/worklogs - Record a new worklog owned by the caller
///
/// Requires `date`, `duration_hours` and `reason`; `notes` defaults to "".
/// Any `id` or `user_id` in the body is ignored.
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<DataEnvelope<Record>> {
    let Json(fields) = payload?;

    let created = state.worklogs.create(&user.id, fields).await?;
    Ok(ApiResponse::created(DataEnvelope::with_message(
        "Worklog created",
        created,
    )))
}

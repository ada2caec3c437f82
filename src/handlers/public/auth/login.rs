// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::{rejection::JsonRejection, Json, State};
use serde::Deserialize;

use super::AuthResponse;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /auth/login - Authenticate and receive a JWT
///
/// ```json
/// { "message": "...", "token": "eyJ...", "user": { "id": "...", "username": "...", "display_name": "..." }, "expiresIn": "365d" }
/// ```
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthResponse> {
    let Json(request) = payload?;

    let session = state
        .users
        .login(request.username.as_deref(), request.password.as_deref())
        .await?;

    Ok(ApiResponse::success(AuthResponse::logged_in(session)))
}

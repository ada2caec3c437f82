// handlers/public/auth/register.rs - POST /auth/register handler

use axum::extract::{rejection::JsonRejection, Json, State};
use serde::Deserialize;

use super::AuthResponse;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
}

/// POST /auth/register - Create an account and return a token for it
///
/// `display_name` defaults to the username. Responds 201, or 400 when
/// username/password is missing, or 409 when the username is taken.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<AuthResponse> {
    let Json(request) = payload?;

    let session = state
        .users
        .register(
            request.username.as_deref(),
            request.password.as_deref(),
            request.display_name.as_deref(),
        )
        .await?;

    Ok(ApiResponse::created(AuthResponse::registered(session)))
}

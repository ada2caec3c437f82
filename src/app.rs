use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::schema;
use crate::handlers;
use crate::middleware::jwt_auth_middleware;
use crate::sheets::StoreError;
use crate::state::AppState;

/// The full HTTP surface. `request_logging` adds a per-request trace span.
pub fn app(state: AppState, request_logging: bool) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes
        .merge(auth_public_routes())
        // Protected API
        .merge(worklog_routes(state.clone()));

    if request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    // Global middleware
    router.layer(CorsLayer::permissive()).with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
}

fn worklog_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::worklogs;

    Router::new()
        .route(
            "/api/worklogs",
            get(worklogs::collection_get).post(worklogs::collection_post),
        )
        .route(
            "/api/worklogs/:id",
            axum::routing::put(worklogs::record_put).delete(worklogs::record_delete),
        )
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Google Sheets Overwork Tracker API",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match probe_store(&state).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "store": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "store": "unavailable"
                })),
            )
        }
    }
}

/// One read against the users table. A table that is not provisioned yet
/// still proves the store answers.
async fn probe_store(state: &AppState) -> Result<(), StoreError> {
    let store = state.stores.store()?;
    match store.get_values(&schema::USERS.range()).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_missing_range() => Ok(()),
        Err(e) => Err(e),
    }
}

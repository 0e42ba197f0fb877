//! Content document routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use super::JsonBody;
use crate::error::AppResult;
use crate::middleware::AdminSession;
use crate::state::AppState;

/// Create the content router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/content/{key}",
        get(get_content).put(put_content).delete(delete_content),
    )
}

/// GET /content/{key}
async fn get_content(State(state): State<AppState>, Path(key): Path<String>) -> AppResult<Json<Value>> {
    Ok(Json(state.content().get(&key).await?))
}

/// PUT /content/{key}: full replacement.
async fn put_content(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(key): Path<String>,
    JsonBody(document): JsonBody<Value>,
) -> AppResult<Json<Value>> {
    state.content().set(&key, document).await?;
    Ok(Json(json!({ "status": "ok", "key": key })))
}

/// DELETE /content/{key}
async fn delete_content(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    state.content().delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

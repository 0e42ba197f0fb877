//! Page builder routes.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use super::JsonBody;
use crate::content::BlockTypeRegistry;
use crate::error::AppResult;
use crate::middleware::AdminSession;
use crate::state::AppState;

/// Create the pages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pages", get(list_pages))
        .route("/pages/{slug}", get(get_page).put(save_page))
        .route("/blocks/definitions", get(block_definitions))
}

/// GET /pages
async fn list_pages(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.pages().list_pages().await?))
}

/// GET /pages/{slug}
async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Vec<Value>>> {
    Ok(Json(state.pages().get_page(&slug).await?))
}

/// PUT /pages/{slug}
async fn save_page(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(slug): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> AppResult<Json<Value>> {
    let blocks = state.pages().save_page(&slug, body).await?;
    Ok(Json(json!({ "status": "ok", "blocks": blocks })))
}

/// GET /blocks/definitions
async fn block_definitions(State(state): State<AppState>) -> Json<BlockTypeRegistry> {
    Json(state.pages().definitions().clone())
}

//! Collection routes: `/services`, `/articles` (or `/blogs`), `/gallery`.
//!
//! `PUT /{kind}` takes either an array (bulk replace) or a single object
//! (upsert by key).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use super::JsonBody;
use crate::error::{AppError, AppResult};
use crate::middleware::AdminSession;
use crate::models::{CollectionKind, Record};
use crate::state::AppState;
use crate::storage::UpsertOutcome;

/// Create the collections router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{kind}", get(list_records).put(write_records))
        .route("/{kind}/{key}", get(get_record))
}

fn kind_from(segment: &str) -> AppResult<CollectionKind> {
    CollectionKind::from_segment(segment).ok_or(AppError::NotFound)
}

/// GET /{kind}
async fn list_records(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> AppResult<Json<Vec<Record>>> {
    let kind = kind_from(&kind)?;
    Ok(Json(state.collection(kind).list().await?))
}

/// GET /{kind}/{key}
async fn get_record(
    State(state): State<AppState>,
    Path((kind, key)): Path<(String, String)>,
) -> AppResult<Json<Record>> {
    let kind = kind_from(&kind)?;
    Ok(Json(state.collection(kind).get_by_key(&key).await?))
}

/// PUT /{kind}
async fn write_records(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(kind): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let manager = state.collection(kind_from(&kind)?);

    match body {
        Value::Array(items) => {
            let summary = manager.replace_all(items).await?;
            Ok((
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "count": summary.count,
                    "skipped": summary.skipped,
                })),
            ))
        }
        Value::Object(_) => {
            let result = manager.upsert_one(body).await?;
            let status = match result.outcome {
                UpsertOutcome::Created => StatusCode::CREATED,
                UpsertOutcome::Updated => StatusCode::OK,
            };
            Ok((
                status,
                Json(json!({ "status": result.outcome, "record": result.record })),
            ))
        }
        _ => Err(AppError::validation(
            "body must be an array of items or a single item object",
        )),
    }
}

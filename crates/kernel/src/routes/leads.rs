//! Contact-form lead routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use super::JsonBody;
use crate::error::AppResult;
use crate::middleware::AdminSession;
use crate::models::Lead;
use crate::services::lead::LeadForm;
use crate::state::AppState;

/// Create the leads router.
pub fn router() -> Router<AppState> {
    Router::new().route("/leads", post(submit_lead).get(list_leads))
}

/// POST /leads
async fn submit_lead(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<LeadForm>,
) -> AppResult<(StatusCode, Json<Lead>)> {
    let lead = state.leads().submit(form).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /leads (admin)
async fn list_leads(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> AppResult<Json<Vec<Lead>>> {
    Ok(Json(state.leads().list().await?))
}

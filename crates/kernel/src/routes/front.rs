//! Service banner.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::state::AppState;

/// Create the front router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(banner))
}

async fn banner() -> Json<Value> {
    Json(json!({
        "detail": "vetrina backend running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

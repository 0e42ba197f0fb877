//! Admin login routes.

use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::routing::post;
use axum::{Form, Json, Router};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::services::auth::TokenResponse;
use crate::state::AppState;

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/admin/login", post(login))
}

/// Login credentials. `username` is accepted for OAuth2-style password forms.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginRequest {
    #[serde(alias = "username")]
    email: String,
    password: String,
}

/// POST /auth/login
///
/// Accepts JSON or `application/x-www-form-urlencoded`.
async fn login(State(state): State<AppState>, request: Request) -> AppResult<Json<TokenResponse>> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    let credentials = if is_form {
        Form::<LoginRequest>::from_request(request, &state)
            .await
            .map(|Form(c)| c)
            .map_err(|e| AppError::Validation(e.body_text()))?
    } else {
        Json::<LoginRequest>::from_request(request, &state)
            .await
            .map(|Json(c)| c)
            .map_err(|e| AppError::Validation(e.body_text()))?
    };

    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(AppError::validation("email and password are required"));
    }

    let token = state
        .auth()
        .login(&credentials.email, &credentials.password)?;
    Ok(Json(token))
}

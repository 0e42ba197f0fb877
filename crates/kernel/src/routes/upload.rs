//! Image upload route.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::file::{MAX_FILE_SIZE, UploadResult};
use crate::middleware::AdminSession;
use crate::state::AppState;

/// Headroom for multipart framing around the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the upload router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + MULTIPART_OVERHEAD))
}

/// Upload an image.
///
/// POST /upload
/// Content-Type: multipart/form-data
///
/// Form fields:
/// - file: The file to upload
async fn upload_file(
    State(state): State<AppState>,
    _admin: AdminSession,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResult>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| {
            warn!(error = %e, "failed to read upload data");
            AppError::Validation(e.body_text())
        })?;

        let result = state
            .uploads()
            .upload(content_type.as_deref(), &data)
            .await?;
        return Ok(Json(result));
    }

    Err(AppError::validation("no file provided"))
}

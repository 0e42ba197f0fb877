//! Upload service: validation and storage of image uploads.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tracing::info;

use super::storage::BlobStorage;
use crate::error::{AppError, AppResult};
use crate::storage::bounded;

/// Maximum upload size (10 MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Sniffed image types accepted for upload, with their stored extension.
pub const ALLOWED_MIME_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

const SVG_MIME: &str = "image/svg+xml";

/// Active content in SVG: script-bearing elements, event-handler attributes,
/// script URL schemes and entity declarations.
static SVG_ACTIVE_CONTENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<\s*(script|foreignobject|iframe|embed|object|handler)\b|[\s/"']on[a-z]+\s*=|(javascript|vbscript)\s*:|data\s*:\s*text/html|<!entity"#,
    )
    .ok()
});

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub url: String,
    pub mime_type: &'static str,
    pub size: usize,
}

/// Upload service.
#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn BlobStorage>,
    timeout: Duration,
}

impl UploadService {
    pub fn new(storage: Arc<dyn BlobStorage>, timeout: Duration) -> Self {
        Self { storage, timeout }
    }

    /// Validate and store an upload.
    ///
    /// The type is taken from the bytes, not from the client. SVG carries no
    /// magic number, so it is accepted only when declared and script-free.
    pub async fn upload(&self, declared_type: Option<&str>, data: &[u8]) -> AppResult<UploadResult> {
        if data.is_empty() {
            return Err(AppError::validation("file is empty"));
        }
        if data.len() > MAX_FILE_SIZE {
            return Err(AppError::validation(format!(
                "file too large: {} bytes (max {MAX_FILE_SIZE} bytes)",
                data.len()
            )));
        }

        let (mime_type, extension) = detect_type(declared_type, data)?;

        let url = bounded(
            self.timeout,
            "blob store",
            self.storage.store(data, mime_type, extension),
        )
        .await?;

        info!(url = %url, mime_type, size = data.len(), backend = self.storage.scheme(), "file uploaded");
        Ok(UploadResult {
            url,
            mime_type,
            size: data.len(),
        })
    }
}

/// Resolve an upload to one of the accepted types.
pub fn detect_type(
    declared_type: Option<&str>,
    data: &[u8],
) -> AppResult<(&'static str, &'static str)> {
    let sniffed = infer::get(data);
    let is_binary = sniffed.is_some_and(|kind| kind.matcher_type() != infer::MatcherType::Text);

    let declared = declared_type.map(|t| t.split(';').next().unwrap_or(t).trim());
    if !is_binary && declared == Some(SVG_MIME) && is_safe_svg(data) {
        return Ok((SVG_MIME, "svg"));
    }

    match sniffed {
        Some(kind) => ALLOWED_MIME_TYPES
            .iter()
            .find(|(mime, _)| *mime == kind.mime_type())
            .copied()
            .ok_or_else(|| {
                AppError::validation(format!("file type not allowed: {}", kind.mime_type()))
            }),
        None => Err(AppError::validation("file type not allowed")),
    }
}

fn is_safe_svg(data: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(data) else {
        return false;
    };
    let Some(active) = SVG_ACTIVE_CONTENT.as_ref() else {
        return false;
    };
    text.to_ascii_lowercase().contains("<svg") && !active.is_match(text)
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService")
            .field("backend", &self.storage.scheme())
            .finish()
    }
}

//! Blob storage backends.
//!
//! Provides trait and implementations for storing uploads locally or in S3.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Blob storage backend trait.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store bytes under a fresh name and return a retrievable URL.
    async fn store(&self, data: &[u8], content_type: &str, extension: &str) -> Result<String>;

    /// Get the storage scheme (e.g., "local", "s3").
    fn scheme(&self) -> &'static str;
}

/// Generate a relative object path for a new upload: `yyyy/mm/<id8>.<ext>`.
pub fn generate_path(extension: &str) -> String {
    let now = chrono::Utc::now();
    let unique_id = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}/{}.{}",
        now.format("%Y"),
        now.format("%m"),
        &unique_id[..8],
        extension
    )
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// Local filesystem storage.
pub struct LocalBlobStorage {
    /// Base path for file storage.
    base_path: PathBuf,
    /// Base URL for public file access.
    base_url: String,
}

impl LocalBlobStorage {
    /// Create a new local blob storage.
    pub fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn store(&self, data: &[u8], content_type: &str, extension: &str) -> Result<String> {
        let relative = generate_path(extension);
        let path = self.base_path.join(&relative);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("failed to create directories")?;
        }

        let mut file = fs::File::create(&path)
            .await
            .context("failed to create file")?;
        file.write_all(data).await.context("failed to write file")?;
        file.flush().await.context("failed to flush file")?;

        debug!(path = ?path, content_type, size = data.len(), "upload written");
        Ok(join_url(&self.base_url, &relative))
    }

    fn scheme(&self) -> &'static str {
        "local"
    }
}

impl std::fmt::Debug for LocalBlobStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBlobStorage")
            .field("base_path", &self.base_path)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// S3-compatible object storage.
#[cfg(feature = "s3")]
pub struct S3BlobStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    /// Optional prefix for all keys.
    prefix: Option<String>,
    /// Base URL for public access (e.g., CloudFront distribution).
    base_url: String,
}

#[cfg(feature = "s3")]
impl S3BlobStorage {
    /// Create a new S3 blob storage.
    ///
    /// Uses the default AWS credential chain (env vars, config file, instance profile).
    /// `endpoint_url` selects an S3-compatible service such as MinIO.
    pub async fn new(
        endpoint_url: Option<&str>,
        bucket: impl Into<String>,
        prefix: Option<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let mut loader = aws_config::from_env();
        if let Some(endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        Ok(Self {
            client: aws_sdk_s3::Client::new(&config),
            bucket: bucket.into(),
            prefix,
            base_url: base_url.into(),
        })
    }

    fn object_key(&self, relative: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), relative),
            None => relative.to_string(),
        }
    }
}

#[cfg(feature = "s3")]
#[async_trait]
impl BlobStorage for S3BlobStorage {
    async fn store(&self, data: &[u8], content_type: &str, extension: &str) -> Result<String> {
        let key = self.object_key(&generate_path(extension));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(aws_sdk_s3::primitives::ByteStream::from(data.to_vec()))
            .send()
            .await
            .context("failed to upload to S3")?;

        debug!(key = %key, size = data.len(), "upload written to S3");
        Ok(join_url(&self.base_url, &key))
    }

    fn scheme(&self) -> &'static str {
        "s3"
    }
}

#[cfg(feature = "s3")]
impl std::fmt::Debug for S3BlobStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3BlobStorage")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn generated_path_shape() {
        let path = generate_path("png");
        let parts: Vec<&str> = path.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 4);
        assert_eq!(parts[1].len(), 2);
        assert!(parts[2].ends_with(".png"));
        assert_eq!(parts[2].len(), 8 + ".png".len());
    }

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(join_url("/static/uploads/", "a/b.png"), "/static/uploads/a/b.png");
        assert_eq!(
            join_url("https://cdn.example.com", "a/b.png"),
            "https://cdn.example.com/a/b.png"
        );
    }

    #[tokio::test]
    async fn local_store_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalBlobStorage::new(dir.path(), "/static/uploads");

        let url = storage.store(b"bytes", "image/png", "png").await.unwrap();
        assert!(url.starts_with("/static/uploads/"));
        assert!(url.ends_with(".png"));

        let relative = url.strip_prefix("/static/uploads/").unwrap();
        let written = std::fs::read(dir.path().join(relative)).unwrap();
        assert_eq!(written, b"bytes");
    }

    #[tokio::test]
    async fn local_store_never_reuses_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalBlobStorage::new(dir.path(), "/files");
        let a = storage.store(b"a", "image/gif", "gif").await.unwrap();
        let b = storage.store(b"b", "image/gif", "gif").await.unwrap();
        assert_ne!(a, b);
    }
}

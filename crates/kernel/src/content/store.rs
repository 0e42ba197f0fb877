//! Content store: one JSON document per key.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::storage::{DocumentStore, bounded};

/// Longest accepted document key.
pub const MAX_KEY_LEN: usize = 200;

/// Key prefix reserved for composed pages.
pub const PAGE_PREFIX: &str = "page:";

/// Singleton document storage. Every write is a full replacement.
#[derive(Clone)]
pub struct ContentStore {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl ContentStore {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Load a document, or `NotFound`.
    pub async fn get(&self, key: &str) -> AppResult<Value> {
        bounded(self.timeout, "content get", self.store.get(key))
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Create or overwrite a public document.
    ///
    /// Keys under the page namespace are rejected; pages go through the
    /// page composer so their blocks get validated.
    pub async fn set(&self, key: &str, document: Value) -> AppResult<()> {
        validate_key(key)?;
        if key.starts_with(PAGE_PREFIX) {
            return Err(AppError::validation(format!(
                "keys starting with '{PAGE_PREFIX}' are reserved for pages"
            )));
        }
        self.put(key, document).await
    }

    /// Delete a document, or `NotFound`.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        let removed = bounded(self.timeout, "content delete", self.store.delete(key)).await?;
        if !removed {
            return Err(AppError::NotFound);
        }
        info!(key = %key, "content deleted");
        Ok(())
    }

    /// Keys under a prefix, sorted.
    pub async fn keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        let keys = bounded(self.timeout, "content keys", self.store.keys(prefix)).await?;
        Ok(keys)
    }

    /// Write without the namespace check. Used by the page composer and seeding.
    pub(crate) async fn put(&self, key: &str, document: Value) -> AppResult<()> {
        validate_key(key)?;
        bounded(self.timeout, "content set", self.store.set(key, document)).await?;
        info!(key = %key, "content saved");
        Ok(())
    }
}

fn validate_key(key: &str) -> AppResult<()> {
    if key.trim().is_empty() {
        return Err(AppError::validation("content key must not be empty"));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(AppError::validation(format!(
            "content key must be at most {MAX_KEY_LEN} characters"
        )));
    }
    Ok(())
}

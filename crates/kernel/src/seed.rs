//! Bootstrap content documents from a directory of JSON files.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{info, warn};

use crate::content::ContentStore;

/// Load every `*.json` file in `dir` into the content store.
///
/// The file stem is the document key; existing documents are overwritten.
/// Files that cannot be read or parsed are skipped with a warning. Returns
/// the number of documents written.
pub async fn seed_dir(content: &ContentStore, dir: &Path) -> Result<usize> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to read seed directory {}", dir.display()))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .context("failed to list seed directory")?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut written = 0;
    for path in paths {
        let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let document = match read_json(&path).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "skipping seed file");
                continue;
            }
        };

        if let Err(e) = content.put(key, document).await {
            warn!(key, error = %e, "failed to seed document");
            continue;
        }
        written += 1;
    }

    info!(dir = %dir.display(), count = written, "seeded content");
    Ok(written)
}

async fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).await.context("failed to read file")?;
    serde_json::from_str(&raw).context("invalid JSON")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn content() -> ContentStore {
        ContentStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn seeds_json_files_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("homepage.json"), r#"{"hero":{"title":"Hi"}}"#).unwrap();
        std::fs::write(dir.path().join("footer.json"), r#"{"phone":"0123"}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let store = content();
        let count = seed_dir(&store, dir.path()).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            store.get("homepage").await.unwrap(),
            json!({ "hero": { "title": "Hi" } })
        );
        assert!(matches!(store.get("broken").await, Err(AppError::NotFound)));
        assert!(matches!(store.get("notes").await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn seeding_overwrites_existing_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("footer.json"), r#"{"phone":"new"}"#).unwrap();

        let store = content();
        store.set("footer", json!({ "phone": "old" })).await.unwrap();
        seed_dir(&store, dir.path()).await.unwrap();
        assert_eq!(store.get("footer").await.unwrap(), json!({ "phone": "new" }));
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(seed_dir(&content(), &dir.path().join("nope")).await.is_err());
    }
}

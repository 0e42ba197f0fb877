//! Page composer: named pages as ordered lists of typed blocks.
//!
//! Pages live in the content store under `page:{slug}`. Saves are validated
//! against the block catalog and long-text fields are sanitized before the
//! list is written.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::block_types::BlockTypeRegistry;
use super::slug::slugify;
use super::store::{ContentStore, PAGE_PREFIX};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PageComposer {
    content: ContentStore,
    registry: Arc<BlockTypeRegistry>,
}

impl PageComposer {
    pub fn new(content: ContentStore, registry: Arc<BlockTypeRegistry>) -> Self {
        Self { content, registry }
    }

    /// The block catalog.
    pub fn definitions(&self) -> &BlockTypeRegistry {
        &self.registry
    }

    /// Slugs of all stored pages, sorted.
    pub async fn list_pages(&self) -> AppResult<Vec<String>> {
        let keys = self.content.keys(PAGE_PREFIX).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(PAGE_PREFIX).map(String::from))
            .collect())
    }

    /// Blocks of a page; an unknown page is an empty list.
    pub async fn get_page(&self, slug: &str) -> AppResult<Vec<Value>> {
        let slug = page_slug(slug)?;
        match self.content.get(&page_key(&slug)).await {
            Ok(Value::Array(blocks)) => Ok(blocks),
            Ok(_) | Err(AppError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Replace a page's blocks.
    ///
    /// Accepts either a bare array of blocks or `{ "blocks": [...] }`. All
    /// block errors are reported together; nothing is written unless every
    /// block validates.
    pub async fn save_page(&self, slug: &str, body: Value) -> AppResult<Vec<Value>> {
        let slug = page_slug(slug)?;
        let mut blocks = match body {
            Value::Array(blocks) => blocks,
            Value::Object(mut map) => match map.remove("blocks") {
                Some(Value::Array(blocks)) => blocks,
                _ => {
                    return Err(AppError::validation(
                        "page body must be a list of blocks or an object with a 'blocks' list",
                    ));
                }
            },
            _ => return Err(AppError::validation("page body must be a list of blocks")),
        };

        let errors: Vec<String> = blocks
            .iter()
            .enumerate()
            .flat_map(|(i, block)| {
                self.registry
                    .validate_block(block)
                    .into_iter()
                    .map(move |e| format!("block {i}: {e}"))
            })
            .collect();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join("; ")));
        }

        self.registry.sanitize_blocks(&mut blocks);
        self.content
            .put(&page_key(&slug), Value::Array(blocks.clone()))
            .await?;

        info!(page = %slug, blocks = blocks.len(), "page saved");
        Ok(blocks)
    }
}

fn page_key(slug: &str) -> String {
    format!("{PAGE_PREFIX}{slug}")
}

fn page_slug(raw: &str) -> AppResult<String> {
    let slug = slugify(raw);
    if slug.is_empty() {
        return Err(AppError::validation("page slug must not be empty"));
    }
    Ok(slug)
}

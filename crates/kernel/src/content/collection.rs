//! Collection manager: uniquely keyed record sets.
//!
//! One manager per [`CollectionKind`]. Payloads are free-form JSON objects;
//! the manager resolves each payload's unique key (explicit, or slugified
//! from another field), copies the listing fields into the denormalized
//! columns, and hands the result to the [`RecordStore`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::slug::slug_or_random;
use crate::error::{AppError, AppResult};
use crate::models::{CollectionKind, MAX_CATEGORY_LEN, MAX_TITLE_LEN, Record};
use crate::storage::{RecordStore, UpsertOutcome, bounded};

/// Result of a bulk replace.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaceSummary {
    /// Records now in the collection.
    pub count: usize,
    /// Input items dropped for lacking a usable key or not being objects.
    pub skipped: usize,
}

/// Result of a single upsert.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertResult {
    pub outcome: UpsertOutcome,
    pub record: Record,
}

/// Record-set engine for a single kind.
#[derive(Clone)]
pub struct CollectionManager {
    kind: CollectionKind,
    store: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl CollectionManager {
    pub fn new(kind: CollectionKind, store: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self {
            kind,
            store,
            timeout,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// All records, in storage order.
    pub async fn list(&self) -> AppResult<Vec<Record>> {
        let records = bounded(self.timeout, "record list", self.store.list(self.kind)).await?;
        Ok(records)
    }

    /// A single record by unique key.
    pub async fn get_by_key(&self, key: &str) -> AppResult<Record> {
        bounded(self.timeout, "record lookup", self.store.find(self.kind, key))
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Replace the whole collection with `items`.
    ///
    /// Items without a resolvable key are skipped and logged. When two items
    /// resolve to the same key the later one wins and keeps the earlier
    /// one's position.
    pub async fn replace_all(&self, items: Vec<Value>) -> AppResult<ReplaceSummary> {
        let mut records: Vec<Record> = Vec::with_capacity(items.len());
        let mut skipped = 0;

        for (index, item) in items.into_iter().enumerate() {
            let record = match prepare(self.kind, item) {
                Ok(r) => r,
                Err(reason) => {
                    warn!(kind = %self.kind, index, reason = %reason, "skipping collection item");
                    skipped += 1;
                    continue;
                }
            };

            match records.iter_mut().find(|r| r.key == record.key) {
                Some(existing) => {
                    warn!(kind = %self.kind, key = %record.key, "duplicate key in bulk replace, keeping last");
                    *existing = record;
                }
                None => records.push(record),
            }
        }

        let count = bounded(
            self.timeout,
            "record replace",
            self.store.replace_all(self.kind, records),
        )
        .await?;

        info!(kind = %self.kind, count, skipped, "collection replaced");
        Ok(ReplaceSummary { count, skipped })
    }

    /// Create or overwrite the record matching the payload's key.
    pub async fn upsert_one(&self, payload: Value) -> AppResult<UpsertResult> {
        let record = prepare(self.kind, payload).map_err(AppError::Validation)?;

        let outcome = bounded(
            self.timeout,
            "record upsert",
            self.store.upsert(self.kind, record.clone()),
        )
        .await?;

        info!(kind = %self.kind, key = %record.key, ?outcome, "collection record saved");
        Ok(UpsertResult { outcome, record })
    }
}

/// Resolve a payload into a storable record.
///
/// The resolved key is written back into the payload so `data` is always a
/// superset of the denormalized columns.
fn prepare(kind: CollectionKind, payload: Value) -> Result<Record, String> {
    let Value::Object(mut fields) = payload else {
        return Err("item must be a JSON object".to_string());
    };

    let spec = kind.spec();
    let key = match text_field(&fields, spec.key_field) {
        Some(key) => key,
        None => match spec.derive_from {
            Some(source) => match text_field(&fields, source) {
                Some(text) => slug_or_random(&text),
                None => {
                    return Err(format!(
                        "missing '{}' and no '{source}' to derive it from",
                        spec.key_field
                    ));
                }
            },
            None => return Err(format!("missing required field '{}'", spec.key_field)),
        },
    };

    check_len(spec.key_field, &key, spec.max_key_len)?;
    fields.insert(spec.key_field.to_string(), Value::String(key.clone()));

    let title = text_field(&fields, spec.title_field).unwrap_or_default();
    check_len(spec.title_field, &title, MAX_TITLE_LEN)?;
    let category = text_field(&fields, spec.category_field).unwrap_or_default();
    check_len(spec.category_field, &category, MAX_CATEGORY_LEN)?;

    Ok(Record {
        key,
        title,
        category,
        data: Value::Object(fields),
    })
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("'{field}' must be at most {max} characters"));
    }
    Ok(())
}

/// A trimmed, non-empty string field.
fn text_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

//! Persistence abstraction.
//!
//! The services never talk to a database directly; they go through the
//! traits below. Two backends exist:
//!
//! - [`PgStore`] - PostgreSQL via sqlx, used in production.
//! - [`MemoryStore`] - process-local maps, used when no `DATABASE_URL` is
//!   configured and by the test suite.

mod memory;
mod postgres;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::models::{CollectionKind, Lead, NewLead, Record};

/// Key → document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Create or fully replace a document.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete a document. Returns false if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// All keys starting with `prefix`, sorted.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Whether an upsert inserted a new row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Per-kind record storage.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records of a kind in insertion order.
    async fn list(&self, kind: CollectionKind) -> Result<Vec<Record>>;

    /// Look up a record by unique key.
    async fn find(&self, kind: CollectionKind, key: &str) -> Result<Option<Record>>;

    /// Replace every record of `kind` with `records` as one unit.
    ///
    /// Readers see either the old set or the new set, never an empty or
    /// partial one. `records` must not contain duplicate keys.
    async fn replace_all(&self, kind: CollectionKind, records: Vec<Record>) -> Result<usize>;

    /// Insert a record, or overwrite the one with the same key.
    async fn upsert(&self, kind: CollectionKind, record: Record) -> Result<UpsertOutcome>;
}

/// Append-only lead storage.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Persist a lead.
    async fn insert(&self, lead: NewLead) -> Result<Lead>;

    /// All leads, newest first.
    async fn list(&self) -> Result<Vec<Lead>>;
}

/// Backend liveness.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn healthy(&self) -> bool;

    /// Short backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;
}

/// The persistence collaborator handed to the services.
#[derive(Clone)]
pub struct Persistence {
    pub documents: Arc<dyn DocumentStore>,
    pub records: Arc<dyn RecordStore>,
    pub leads: Arc<dyn LeadStore>,
    health: Arc<dyn StoreHealth>,
}

impl Persistence {
    /// Wrap a backend that implements every storage trait.
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: DocumentStore + RecordStore + LeadStore + StoreHealth + 'static,
    {
        Self {
            documents: store.clone(),
            records: store.clone(),
            leads: store.clone(),
            health: store,
        }
    }

    /// A fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub async fn healthy(&self) -> bool {
        self.health.healthy().await
    }

    pub fn backend(&self) -> &'static str {
        self.health.backend()
    }
}

/// Run a collaborator call with an upper time bound.
///
/// An elapsed timer becomes an ordinary error, which the HTTP layer reports
/// as an upstream failure.
pub async fn bounded<T, F>(limit: Duration, what: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!("{what} timed out after {limit:?}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_passes_through_results() {
        let value = bounded(Duration::from_secs(1), "noop", async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn bounded_times_out() {
        let err = bounded(Duration::from_millis(10), "slow call", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("slow call timed out"));
    }

    #[tokio::test]
    async fn in_memory_persistence_is_healthy() {
        let persistence = Persistence::in_memory();
        assert!(persistence.healthy().await);
        assert_eq!(persistence.backend(), "memory");
    }
}

//! In-memory storage backend.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;

use super::{DocumentStore, LeadStore, RecordStore, StoreHealth, UpsertOutcome};
use crate::models::{CollectionKind, Lead, NewLead, Record};

/// Process-local store.
///
/// Documents live in a `DashMap`, so writers to different keys only contend
/// when they hash to the same shard. Each collection kind is a single vector
/// behind its own lock; `replace_all` swaps the vector in one step.
#[derive(Default)]
pub struct MemoryStore {
    documents: DashMap<String, Value>,
    services: RwLock<Vec<Record>>,
    articles: RwLock<Vec<Record>>,
    gallery: RwLock<Vec<Record>>,
    leads: RwLock<Vec<Lead>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, kind: CollectionKind) -> &RwLock<Vec<Record>> {
        match kind {
            CollectionKind::Service => &self.services,
            CollectionKind::Article => &self.articles,
            CollectionKind::Gallery => &self.gallery,
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.documents.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.documents.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.documents.remove(key).is_some())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .documents
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, kind: CollectionKind) -> Result<Vec<Record>> {
        Ok(self.collection(kind).read().clone())
    }

    async fn find(&self, kind: CollectionKind, key: &str) -> Result<Option<Record>> {
        Ok(self
            .collection(kind)
            .read()
            .iter()
            .find(|r| r.key == key)
            .cloned())
    }

    async fn replace_all(&self, kind: CollectionKind, records: Vec<Record>) -> Result<usize> {
        let count = records.len();
        *self.collection(kind).write() = records;
        Ok(count)
    }

    async fn upsert(&self, kind: CollectionKind, record: Record) -> Result<UpsertOutcome> {
        let mut records = self.collection(kind).write();
        match records.iter_mut().find(|r| r.key == record.key) {
            Some(existing) => {
                *existing = record;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                records.push(record);
                Ok(UpsertOutcome::Created)
            }
        }
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn insert(&self, lead: NewLead) -> Result<Lead> {
        let lead = lead.into_lead();
        self.leads.write().push(lead.clone());
        Ok(lead)
    }

    async fn list(&self) -> Result<Vec<Lead>> {
        let mut leads = self.leads.read().clone();
        leads.reverse();
        Ok(leads)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn healthy(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(key: &str) -> Record {
        Record {
            key: key.to_string(),
            title: key.to_uppercase(),
            category: String::new(),
            data: json!({ "slug": key }),
        }
    }

    #[tokio::test]
    async fn keys_filter_by_prefix_and_sort() {
        let store = MemoryStore::new();
        store.set("page:b", json!([])).await.unwrap();
        store.set("page:a", json!([])).await.unwrap();
        store.set("footer", json!({})).await.unwrap();

        let keys = store.keys("page:").await.unwrap();
        assert_eq!(keys, vec!["page:a".to_string(), "page:b".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_see_partial_replace() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let kind = CollectionKind::Article;
        let batch = || vec![record("a"), record("b"), record("c")];
        store.replace_all(kind, batch()).await.unwrap();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..2_000 {
                    store.replace_all(kind, batch()).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        while !writer.is_finished() {
            assert_eq!(RecordStore::list(&*store, kind).await.unwrap().len(), 3);
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn upsert_keeps_position() {
        let store = MemoryStore::new();
        let kind = CollectionKind::Service;
        store.upsert(kind, record("a")).await.unwrap();
        store.upsert(kind, record("b")).await.unwrap();

        let mut changed = record("a");
        changed.title = "Changed".to_string();
        assert_eq!(
            store.upsert(kind, changed).await.unwrap(),
            UpsertOutcome::Updated
        );

        let list = RecordStore::list(&store, kind).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].title, "Changed");
        assert_eq!(list[1].key, "b");
    }

    #[tokio::test]
    async fn kinds_are_independent() {
        let store = MemoryStore::new();
        store
            .replace_all(CollectionKind::Article, vec![record("x")])
            .await
            .unwrap();
        assert!(
            RecordStore::list(&store, CollectionKind::Service)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            store
                .find(CollectionKind::Article, "x")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn leads_list_newest_first() {
        let store = MemoryStore::new();
        for name in ["first", "second"] {
            store
                .insert(NewLead {
                    name: name.to_string(),
                    email: "a@b.co".to_string(),
                    phone: String::new(),
                    message: "hi".to_string(),
                })
                .await
                .unwrap();
        }
        let leads = LeadStore::list(&store).await.unwrap();
        assert_eq!(leads[0].name, "second");
        assert_eq!(leads[1].name, "first");
    }
}

//! PostgreSQL storage backend.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::{DocumentStore, LeadStore, RecordStore, StoreHealth, UpsertOutcome};
use crate::db;
use crate::models::{CollectionKind, Lead, NewLead, Record};

/// sqlx-backed store.
///
/// One `content` table for documents, one table per collection kind with the
/// same column layout, and a `leads` table.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Escape LIKE wildcards so a prefix matches literally.
fn like_prefix(prefix: &str) -> String {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("{escaped}%")
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let value =
            sqlx::query_scalar::<_, Value>("SELECT data FROM content WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .context("failed to get content document")?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        // ON CONFLICT takes the row lock, so concurrent writes to one key
        // serialize and the last one wins.
        sqlx::query(
            r#"
            INSERT INTO content (key, data, updated)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET data = EXCLUDED.data, updated = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .context("failed to set content document")?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM content WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .context("failed to delete content document")?;

        Ok(result.rows_affected() > 0)
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>(
            "SELECT key FROM content WHERE key LIKE $1 ORDER BY key",
        )
        .bind(like_prefix(prefix))
        .fetch_all(&self.pool)
        .await
        .context("failed to list content keys")?;

        Ok(keys)
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn list(&self, kind: CollectionKind) -> Result<Vec<Record>> {
        let sql = format!(
            "SELECT key, title, category, data FROM {} ORDER BY id",
            kind.table()
        );
        let records = sqlx::query_as::<_, Record>(&sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to list {kind}"))?;

        Ok(records)
    }

    async fn find(&self, kind: CollectionKind, key: &str) -> Result<Option<Record>> {
        let sql = format!(
            "SELECT key, title, category, data FROM {} WHERE key = $1",
            kind.table()
        );
        let record = sqlx::query_as::<_, Record>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to fetch {kind} record"))?;

        Ok(record)
    }

    async fn replace_all(&self, kind: CollectionKind, records: Vec<Record>) -> Result<usize> {
        let table = kind.table();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to clear {kind}"))?;

        let insert =
            format!("INSERT INTO {table} (key, title, category, data) VALUES ($1, $2, $3, $4)");
        for record in &records {
            sqlx::query(&insert)
                .bind(&record.key)
                .bind(&record.title)
                .bind(&record.category)
                .bind(&record.data)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to insert {kind} record '{}'", record.key))?;
        }

        tx.commit()
            .await
            .with_context(|| format!("failed to commit {kind} replacement"))?;

        Ok(records.len())
    }

    async fn upsert(&self, kind: CollectionKind, record: Record) -> Result<UpsertOutcome> {
        // xmax is zero only for a freshly inserted row version.
        let sql = format!(
            r#"
            INSERT INTO {} (key, title, category, data)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO UPDATE SET
                title = EXCLUDED.title,
                category = EXCLUDED.category,
                data = EXCLUDED.data
            RETURNING (xmax = 0) AS inserted
            "#,
            kind.table()
        );
        let inserted = sqlx::query_scalar::<_, bool>(&sql)
            .bind(&record.key)
            .bind(&record.title)
            .bind(&record.category)
            .bind(&record.data)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to upsert {kind} record '{}'", record.key))?;

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }
}

#[async_trait]
impl LeadStore for PgStore {
    async fn insert(&self, lead: NewLead) -> Result<Lead> {
        let lead = lead.into_lead();
        let saved = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (id, name, email, phone, message, created)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(lead.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.message)
        .bind(lead.created)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert lead")?;

        Ok(saved)
    }

    async fn list(&self) -> Result<Vec<Lead>> {
        let leads = sqlx::query_as::<_, Lead>("SELECT * FROM leads ORDER BY created DESC")
            .fetch_all(&self.pool)
            .await
            .context("failed to list leads")?;

        Ok(leads)
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn healthy(&self) -> bool {
        db::check_health(&self.pool).await
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

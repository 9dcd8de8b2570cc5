use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub sqlite_path: String,
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self {
            sqlite_path: "sqlite::memory:".to_string(),
        }
    }
}

/// Durable key-value storage backing persisted client state.
#[derive(Debug, Clone)]
pub struct TrustBridgeStorage {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct KvEntry {
    pub entry_key: String,
    pub entry_value: String,
    pub updated_at: String,
}

impl TrustBridgeStorage {
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let uri = normalize_sqlite_uri(&config.sqlite_path);
        let options = SqliteConnectOptions::from_str(&uri)
            .with_context(|| format!("invalid sqlite URI: {}", uri))?
            .create_if_missing(true);

        // every connection to :memory: opens its own database, so pin the
        // pool to a single connection that is never recycled
        let pool_options = if uri.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("failed to connect sqlite pool")?;

        let storage = Self { pool };
        storage.migrate().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA_SQL.split(';') {
            let sql = statement.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("migration failed for statement: {sql}"))?;
        }
        info!("trustbridge sqlite schema ready");
        Ok(())
    }

    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT entry_value FROM kv_entries WHERE entry_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("query kv entry {key}"))
    }

    pub async fn put_value(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO kv_entries(entry_key, entry_value, updated_at) VALUES (?, ?, ?) ON CONFLICT(entry_key) DO UPDATE SET entry_value = excluded.entry_value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .with_context(|| format!("upsert kv entry {key}"))?;

        debug!(key = %key, "kv entry written");
        Ok(())
    }

    pub async fn delete_value(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE entry_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete kv entry {key}"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_values(&self, keys: &[&str]) -> Result<u64> {
        let mut removed = 0;
        for key in keys {
            if self.delete_value(key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub async fn list_entries(&self) -> Result<Vec<KvEntry>> {
        sqlx::query_as::<_, KvEntry>(
            "SELECT entry_key, entry_value, updated_at FROM kv_entries ORDER BY entry_key ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("query kv entries")
    }
}

fn normalize_sqlite_uri(raw: &str) -> String {
    if raw.starts_with("sqlite:") {
        raw.to_string()
    } else {
        format!("sqlite://{raw}")
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_sqlite_uri, StorageConfig, TrustBridgeStorage};

    #[test]
    fn bare_paths_become_sqlite_uris() {
        assert_eq!(normalize_sqlite_uri("state.db"), "sqlite://state.db");
        assert_eq!(normalize_sqlite_uri("sqlite::memory:"), "sqlite::memory:");
    }

    #[tokio::test]
    async fn upsert_overwrites_and_delete_reports_presence() {
        let storage = TrustBridgeStorage::connect(&StorageConfig::in_memory())
            .await
            .expect("connect");

        storage.put_value("k", "one").await.expect("put");
        storage.put_value("k", "two").await.expect("put");
        assert_eq!(storage.get_value("k").await.expect("get").as_deref(), Some("two"));
        assert_eq!(storage.list_entries().await.expect("list").len(), 1);

        assert!(storage.delete_value("k").await.expect("delete"));
        assert!(!storage.delete_value("k").await.expect("delete"));
        assert_eq!(storage.get_value("k").await.expect("get"), None);
    }
}

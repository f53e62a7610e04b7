use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::time::Duration;
use tracing::info;

use super::kv::{check_start, KeyValueStore, Page};
use super::StoreError;
use crate::config::StoreConfig;

/// Key-value backend on a single Postgres table.
/// Keys are compared with the "C" collation so ordering matches byte order.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect using `DATABASE_URL`, optionally switching to `store.database`.
    pub async fn connect(store: &StoreConfig) -> Result<Self, StoreError> {
        let connection_string = Self::build_connection_string(store)?;
        let pool = PgPoolOptions::new()
            .max_connections(store.max_connections)
            .acquire_timeout(Duration::from_secs(store.connection_timeout))
            .connect(&connection_string)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    fn build_connection_string(store: &StoreConfig) -> Result<String, StoreError> {
        let base = std::env::var("DATABASE_URL")
            .map_err(|_| StoreError::ConfigMissing("DATABASE_URL"))?;

        let mut url = url::Url::parse(&base).map_err(|_| StoreError::InvalidDatabaseUrl)?;
        if let Some(database) = &store.database {
            url.set_path(&format!("/{}", database));
        }
        Ok(url.into())
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT COLLATE \"C\" PRIMARY KEY,
                value BYTEA NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;
        info!("kv_store table ready");
        Ok(())
    }
}

/// LIKE pattern matching every key that starts with `prefix`
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl KeyValueStore for PgStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<Vec<u8>, _>("value")))
    }

    async fn range(&self, prefix: &str, start: &str, limit: usize) -> Result<Page, StoreError> {
        check_start(prefix, start)?;
        let from = if start.is_empty() { prefix } else { start };
        // One extra row tells us whether another page exists
        let fetch = (limit > 0).then(|| limit as i64 + 1);

        let rows = sqlx::query(
            "SELECT key, value FROM kv_store
             WHERE key LIKE $1 ESCAPE '\\' AND key >= $2
             ORDER BY key
             LIMIT $3",
        )
        .bind(like_prefix(prefix))
        .bind(from)
        .bind(fetch)
        .fetch_all(&self.pool)
        .await?;

        let mut page = Page::default();
        for row in rows {
            let key: String = row.get("key");
            if limit > 0 && page.entries.len() == limit {
                page.next = Some(key);
                break;
            }
            page.entries.push((key, row.get("value")));
        }
        Ok(page)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_escape_wildcards() {
        assert_eq!(like_prefix("/m/checks/default/"), "/m/checks/default/%");
        assert_eq!(like_prefix("/m/ev_ents/a%b/"), "/m/ev\\_ents/a\\%b/%");
    }
}

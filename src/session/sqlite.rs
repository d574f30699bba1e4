//! SQLite session backend sharing the application's pool.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;

use super::{SessionRecord, SessionStore, SessionValues};

#[derive(Clone)]
pub struct SqliteSessionStore {
    db: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, token: &str) -> anyhow::Result<Option<SessionRecord>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT data, expiry FROM sessions WHERE token = ?1 AND expiry > ?2")
                .bind(token)
                .bind(Utc::now().timestamp())
                .fetch_optional(&self.db)
                .await?;

        let Some((data, expiry)) = row else {
            return Ok(None);
        };
        let values: SessionValues = serde_json::from_str(&data)?;
        let expiry = Utc
            .timestamp_opt(expiry, 0)
            .single()
            .ok_or_else(|| anyhow::anyhow!("session {} has an out-of-range expiry {}", token, expiry))?;
        Ok(Some(SessionRecord { values, expiry }))
    }

    async fn save(&self, token: &str, values: &SessionValues, expiry: DateTime<Utc>) -> anyhow::Result<()> {
        let data = serde_json::to_string(values)?;
        sqlx::query(
            r#"INSERT INTO sessions (token, data, expiry) VALUES (?1, ?2, ?3)
               ON CONFLICT(token) DO UPDATE SET data = excluded.data, expiry = excluded.expiry"#,
        )
        .bind(token)
        .bind(data)
        .bind(expiry.timestamp())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn destroy(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?1")
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_expired(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expiry <= ?1")
            .bind(Utc::now().timestamp())
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{ModelError, ModelResult, Snippet, SnippetStore};

#[derive(Clone)]
pub struct SqliteSnippetStore {
    db: SqlitePool,
}

impl SqliteSnippetStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

fn snippet_from_row(row: &SqliteRow) -> Result<Snippet, sqlx::Error> {
    let created: NaiveDateTime = row.try_get("created")?;
    let expires: NaiveDateTime = row.try_get("expires")?;
    Ok(Snippet {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created: created.and_utc(),
        expires: expires.and_utc(),
    })
}

#[async_trait]
impl SnippetStore for SqliteSnippetStore {
    async fn insert(&self, title: &str, content: &str, ttl_days: i64) -> ModelResult<i64> {
        let result = sqlx::query(
            r#"INSERT INTO snippets (title, content, created, expires)
               VALUES (?1, ?2, datetime('now'), datetime('now', ?3))"#,
        )
        .bind(title)
        .bind(content)
        .bind(format!("{:+} days", ttl_days))
        .execute(&self.db)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn get(&self, id: i64) -> ModelResult<Snippet> {
        let row = sqlx::query(
            r#"SELECT id, title, content, created, expires FROM snippets
               WHERE expires > datetime('now') AND id = ?1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ModelError::NoRecord)?;
        Ok(snippet_from_row(&row)?)
    }

    async fn latest(&self, limit: i64) -> ModelResult<Vec<Snippet>> {
        let rows = sqlx::query(
            r#"SELECT id, title, content, created, expires FROM snippets
               WHERE expires > datetime('now') ORDER BY id DESC LIMIT ?1"#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        let snippets = rows.iter().map(snippet_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(snippets)
    }

    async fn delete(&self, id: i64) -> ModelResult<()> {
        let result = sqlx::query("DELETE FROM snippets WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ModelError::NoRecord);
        }
        Ok(())
    }
}

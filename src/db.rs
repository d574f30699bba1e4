use sqlx::SqlitePool;

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    // Pragmas for better durability/performance
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("Failed to set synchronous mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA busy_timeout=10000;").execute(pool).await {
        tracing::warn!("Failed to set busy_timeout: {}", e);
    }

    // Timestamps are stored in SQLite's datetime() format (UTC) so that
    // plain string comparison against datetime('now') orders correctly.
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS snippets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            created TEXT NOT NULL DEFAULT (datetime('now')),
            expires TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            hashed_password TEXT NOT NULL,
            created TEXT NOT NULL DEFAULT (datetime('now')),
            CONSTRAINT users_uc_email UNIQUE (email)
        )"#,
    )
    .execute(pool)
    .await?;

    // Session values are a JSON object; expiry is a unix timestamp (seconds).
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            expiry INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_snippets_created", "CREATE INDEX IF NOT EXISTS idx_snippets_created ON snippets(created)"),
        ("idx_sessions_expiry", "CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expiry)"),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            tracing::warn!("Failed to create index {}: {}", name, e);
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    // A single connection: every connection to :memory: is its own database.
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_db(&pool).await.unwrap();
    pool
}

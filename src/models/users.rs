use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{Row, SqlitePool};

use super::{ModelError, ModelResult, User, UserStore};

#[derive(Clone)]
pub struct SqliteUserStore {
    db: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Hashes with Argon2id on the blocking pool; returns a PHC string.
async fn hash_password(password: &str) -> ModelResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ModelError::PasswordHash(e.to_string()))
    })
    .await
    .map_err(|e| ModelError::PasswordHash(e.to_string()))?
}

async fn verify_password(password: &str, hash: String) -> ModelResult<bool> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| ModelError::PasswordHash(e.to_string()))?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    })
    .await
    .map_err(|e| ModelError::PasswordHash(e.to_string()))?
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn insert(&self, name: &str, email: &str, password: &str) -> ModelResult<()> {
        let hashed = hash_password(password).await?;
        let result = sqlx::query(
            r#"INSERT INTO users (name, email, hashed_password, created)
               VALUES (?1, ?2, ?3, datetime('now'))"#,
        )
        .bind(name)
        .bind(email)
        .bind(hashed)
        .execute(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(ModelError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> ModelResult<i64> {
        let row = sqlx::query("SELECT id, hashed_password FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        let Some(row) = row else {
            return Err(ModelError::InvalidCredentials);
        };
        let id: i64 = row.try_get("id")?;
        let hashed: String = row.try_get("hashed_password")?;

        if verify_password(password, hashed).await? {
            Ok(id)
        } else {
            Err(ModelError::InvalidCredentials)
        }
    }

    async fn exists(&self, id: i64) -> ModelResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        Ok(exists)
    }

    async fn get(&self, id: i64) -> ModelResult<User> {
        let row = sqlx::query("SELECT id, name, email, created FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ModelError::NoRecord)?;
        let created: NaiveDateTime = row.try_get("created")?;
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            created: created.and_utc(),
        })
    }

    async fn password_update(&self, id: i64, current_password: &str, new_password: &str) -> ModelResult<()> {
        let hashed: Option<String> = sqlx::query_scalar("SELECT hashed_password FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        let hashed = hashed.ok_or(ModelError::NoRecord)?;

        if !verify_password(current_password, hashed).await? {
            return Err(ModelError::InvalidCredentials);
        }

        let new_hash = hash_password(new_password).await?;
        sqlx::query("UPDATE users SET hashed_password = ?1 WHERE id = ?2")
            .bind(new_hash)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

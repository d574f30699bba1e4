//! In-memory session backend for development and testing.
//!
//! Sessions are lost on restart and not shared across processes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{SessionRecord, SessionStore, SessionValues};

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: &str) -> anyhow::Result<Option<SessionRecord>> {
        let records = self.records.read().await;
        Ok(records
            .get(token)
            .filter(|record| record.expiry > Utc::now())
            .cloned())
    }

    async fn save(&self, token: &str, values: &SessionValues, expiry: DateTime<Utc>) -> anyhow::Result<()> {
        self.records.write().await.insert(
            token.to_string(),
            SessionRecord {
                values: values.clone(),
                expiry,
            },
        );
        Ok(())
    }

    async fn destroy(&self, token: &str) -> anyhow::Result<()> {
        self.records.write().await.remove(token);
        Ok(())
    }

    async fn delete_expired(&self) -> anyhow::Result<u64> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.expiry > now);
        Ok((before - records.len()) as u64)
    }
}

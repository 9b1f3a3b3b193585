//! In-memory session store for testing, development and as the process-local
//! fallback when the external backend is unavailable.
//!
//! Uses a HashMap guarded by an async RwLock. Expiry is lazy: reads treat a
//! stale entry as absent and writes sweep whatever has expired. Not suitable
//! for multi-server deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::session::SessionRecord;
use crate::ports::{SessionStore, StoreError};

/// In-process session store with per-entry TTL.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<String, Entry>>,
}

#[derive(Debug, Clone)]
struct Entry {
    record: SessionRecord,
    expires_at: Instant,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) records, for tests and diagnostics.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| e.expires_at > now).count()
    }

    /// True when no live record is held.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let entries = self.entries.read().await;
        let record = entries
            .get(id.as_str())
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.record.clone());
        Ok(record)
    }

    async fn put(&self, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        // Writes double as the sweep so expired sessions do not pile up.
        entries.retain(|_, entry| entry.expires_at > now);

        entries.insert(
            record.session_id().as_str().to_string(),
            Entry {
                record: record.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }
}

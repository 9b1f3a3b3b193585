//! Redis-backed session store for production deployments.
//!
//! Records are serialized as JSON and written with SET EX so expiry is
//! entirely Redis's business: every write refreshes the TTL, and a session
//! that goes quiet simply ages out.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::domain::foundation::SessionId;
use crate::domain::session::SessionRecord;
use crate::ports::{SessionStore, StoreError};

/// Redis-backed session store.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
}

impl RedisSessionStore {
    /// Connects to the given Redis URL.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::unavailable(e.to_string()))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| StoreError::unavailable(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Wraps an existing connection (for sharing a pool).
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Returns the Redis key for a session.
    fn key(id: &SessionId) -> String {
        format!("baitline:session:{}", id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let mut conn = self.conn.clone();

        let raw: Option<String> = conn
            .get(Self::key(id))
            .await
            .map_err(|e: redis::RedisError| StoreError::unavailable(e.to_string()))?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| StoreError::corrupt(id.as_str(), e.to_string()))
        })
        .transpose()
    }

    async fn put(&self, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)
            .map_err(|e| StoreError::corrupt(record.session_id().as_str(), e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(Self::key(record.session_id()), json, ttl.as_secs())
            .await
            .map_err(|e: redis::RedisError| StoreError::unavailable(e.to_string()))?;

        Ok(())
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore").finish_non_exhaustive()
    }
}

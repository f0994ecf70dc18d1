//! Session records with lazy expiry

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::backend::KvBackend;
use crate::auth::models::{MerchantId, UserId};
use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::error::{Error, Result};

/// Server-side session state, reachable only through its session id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<MerchantId>,
    pub email: String,
    /// Unix seconds
    pub created_at: i64,
    /// Absolute expiry, unix seconds
    pub expires_at: i64,
}

impl SessionRecord {
    /// Snapshot of a user's identity; timestamps are set when the record is stored
    pub fn new(user_id: UserId, role: &str, merchant_id: Option<MerchantId>, email: &str) -> Self {
        Self {
            user_id,
            role: role.to_string(),
            merchant_id,
            email: email.to_string(),
            created_at: 0,
            expires_at: 0,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at < now
    }
}

/// Generate an unguessable session identifier (256 random bits, hex encoded)
pub fn generate_session_id() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Shorten a session id for log output
pub(crate) fn redact(session_id: &str) -> &str {
    session_id.get(..8).unwrap_or(session_id)
}

/// TTL-bounded session records on top of a [`KvBackend`]
///
/// The record's own `expires_at` is authoritative: an expired record found on
/// read is deleted and reported as missing, whatever the backend TTL says.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KvBackend>,
    clock: Arc<dyn Clock>,
    ttl_secs: i64,
    key_prefix: String,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KvBackend>, clock: Arc<dyn Clock>, config: &SessionConfig) -> Self {
        Self {
            backend,
            clock,
            ttl_secs: config.ttl_secs,
            key_prefix: config.key_prefix.clone(),
            timeout: config.backend_timeout(),
        }
    }

    pub fn key(&self, session_id: &str) -> String {
        format!("{}{}", self.key_prefix, session_id)
    }

    /// Store `record` under `session_id` for one TTL from now, replacing any existing record
    pub async fn create(&self, session_id: &str, mut record: SessionRecord) -> Result<SessionRecord> {
        let now = self.clock.now();
        record.created_at = now;
        record.expires_at = now + self.ttl_secs;
        self.put(session_id, &record).await?;
        tracing::debug!(session = redact(session_id), user_id = record.user_id, "Created session");
        Ok(record)
    }

    /// Fetch a live record, deleting it if it has expired
    pub async fn get(&self, session_id: &str) -> Result<SessionRecord> {
        let key = self.key(session_id);
        let raw = tokio::time::timeout(self.timeout, self.backend.get(&key))
            .await??
            .ok_or(Error::SessionNotFound)?;

        let record: SessionRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(session = redact(session_id), "Discarding unreadable session: {}", e);
                self.delete(session_id).await?;
                return Err(Error::SessionNotFound);
            }
        };

        if record.is_expired(self.clock.now()) {
            self.delete(session_id).await?;
            tracing::debug!(session = redact(session_id), "Session expired");
            return Err(Error::SessionNotFound);
        }

        Ok(record)
    }

    /// Remove a session; removing an unknown session succeeds
    pub async fn delete(&self, session_id: &str) -> Result<()> {
        let key = self.key(session_id);
        tokio::time::timeout(self.timeout, self.backend.delete(&key)).await??;
        Ok(())
    }

    /// Push a live session's expiry one TTL past now
    ///
    /// The read and the write are separate backend calls; a delete landing
    /// between them is overwritten.
    pub async fn refresh(&self, session_id: &str) -> Result<SessionRecord> {
        let mut record = self.get(session_id).await?;
        record.expires_at = self.clock.now() + self.ttl_secs;
        self.put(session_id, &record).await?;
        Ok(record)
    }

    async fn put(&self, session_id: &str, record: &SessionRecord) -> Result<()> {
        let remaining = (record.expires_at - self.clock.now()).max(1) as u64;
        let value = serde_json::to_string(record)?;
        let key = self.key(session_id);
        tokio::time::timeout(
            self.timeout,
            self.backend
                .set_with_ttl(&key, value, Duration::from_secs(remaining)),
        )
        .await??;
        Ok(())
    }
}

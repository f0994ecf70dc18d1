//! Single-use bookkeeping for refresh tokens

use std::sync::Arc;
use std::time::Duration;

use super::backend::KvBackend;
use crate::clock::Clock;
use crate::error::Result;

const KEY_PREFIX: &str = "refresh:";

/// Records spent refresh token ids until the tokens would have expired anyway
#[derive(Clone)]
pub struct RefreshLedger {
    backend: Arc<dyn KvBackend>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl RefreshLedger {
    pub fn new(backend: Arc<dyn KvBackend>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            backend,
            clock,
            timeout,
        }
    }

    /// Mark `token_id` as used; returns false if it had already been used
    pub async fn claim(&self, token_id: &str, expires_at: i64) -> Result<bool> {
        let remaining = (expires_at - self.clock.now()).max(1) as u64;
        let key = format!("{}{}", KEY_PREFIX, token_id);
        let claimed = tokio::time::timeout(
            self.timeout,
            self.backend
                .set_if_absent(&key, "used".to_string(), Duration::from_secs(remaining)),
        )
        .await??;
        Ok(claimed)
    }
}

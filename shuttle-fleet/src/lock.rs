use crate::FleetResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Opaque proof of lock ownership; only the holder's token releases the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken(pub String);

impl LockToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Mutual exclusion for synchronization cycles. The TTL bounds how long a
/// crashed holder can block the next cycle.
#[async_trait]
pub trait CycleLock: Send + Sync {
    async fn try_acquire(&self, name: &str, ttl: Duration) -> FleetResult<Option<LockToken>>;
    async fn release(&self, name: &str, token: &LockToken) -> FleetResult<()>;
}

/// Process-local lock for single-instance deployments and tests.
#[derive(Default)]
pub struct LocalCycleLock {
    held: Mutex<HashMap<String, (LockToken, Instant)>>,
}

impl LocalCycleLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CycleLock for LocalCycleLock {
    async fn try_acquire(&self, name: &str, ttl: Duration) -> FleetResult<Option<LockToken>> {
        let mut held = self.held.lock().await;
        let now = Instant::now();
        if let Some((_, expires_at)) = held.get(name) {
            if *expires_at > now {
                return Ok(None);
            }
        }
        let token = LockToken::generate();
        held.insert(name.to_string(), (token.clone(), now + ttl));
        Ok(Some(token))
    }

    async fn release(&self, name: &str, token: &LockToken) -> FleetResult<()> {
        let mut held = self.held.lock().await;
        if held.get(name).is_some_and(|(owner, _)| owner == token) {
            held.remove(name);
        }
        Ok(())
    }
}

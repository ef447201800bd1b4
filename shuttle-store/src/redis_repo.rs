use async_trait::async_trait;
use redis::RedisResult;
use shuttle_fleet::{CycleLock, FleetError, FleetResult, LockToken};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// SET NX EX: true when this caller now owns `key`.
    pub async fn acquire_lock(&self, key: &str, owner: &str, ttl_seconds: u64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(owner)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await?;

        Ok(result.is_some())
    }

    /// Deletes `key` only while `owner` still holds it.
    pub async fn release_lock(&self, key: &str, owner: &str) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let script = redis::Script::new(r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            else
                return 0
            end
        "#);

        let removed: i64 = script.key(key).arg(owner).invoke_async(&mut conn).await?;
        Ok(removed == 1)
    }

    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .ignore()
            .expire(key, window_seconds)
            .ignore()
            .get(key)
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

fn lock_key(name: &str) -> String {
    format!("lock:{}", name)
}

#[async_trait]
impl CycleLock for RedisClient {
    async fn try_acquire(&self, name: &str, ttl: Duration) -> FleetResult<Option<LockToken>> {
        let token = LockToken::generate();
        let acquired = self
            .acquire_lock(&lock_key(name), &token.0, ttl.as_secs().max(1))
            .await
            .map_err(|e| FleetError::Lock(e.to_string()))?;

        if acquired {
            info!(lock = name, "Acquired cycle lock");
            Ok(Some(token))
        } else {
            Ok(None)
        }
    }

    async fn release(&self, name: &str, token: &LockToken) -> FleetResult<()> {
        let released = self
            .release_lock(&lock_key(name), &token.0)
            .await
            .map_err(|e| FleetError::Lock(e.to_string()))?;
        if !released {
            debug!(lock = name, "Cycle lock expired before release");
        }
        Ok(())
    }
}

//! Per-domain cooldown gate backed by a shared KV store (Redis), so
//! multiple worker processes cooperate without direct coordination.
//!
//! This is the only piece of cross-process shared mutable state; contention
//! is negligible since it's pure TTL writes/reads.

use redis::AsyncCommands;
use std::time::Duration;

use crate::error::Result;

const KEY_PREFIX: &str = "rate_limit:";

pub const SUCCESS_TTL: Duration = Duration::from_secs(5);
pub const FAILURE_TTL: Duration = Duration::from_secs(30);
pub const CAPTCHA_TTL: Duration = Duration::from_secs(300);

fn key_for(domain: &str) -> String {
    format!("{KEY_PREFIX}{domain}")
}

#[derive(Clone)]
pub struct RateGate {
    client: redis::Client,
}

impl RateGate {
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(crate::error::Error::Redis)?;
        Ok(Self { client })
    }

    /// Remaining TTL in seconds for `domain`, or 0 if the gate is clear (no
    /// key present).
    pub async fn check(&self, domain: &str) -> Result<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let ttl: i64 = conn.ttl(key_for(domain)).await?;
        Ok(ttl.max(0) as u64)
    }

    /// Sets the gate for `domain` to expire in `ttl`. Any non-empty value is
    /// sufficient; presence of the key is what matters.
    pub async fn set(&self, domain: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let secs = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key_for(domain), 1, secs).await?;
        Ok(())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Wall-clock source, injectable so gates and caches can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[async_trait]
pub trait HealthCheckService: Send + Sync {
    async fn check_store(&self) -> anyhow::Result<bool>;
    async fn check_redemption_log(&self) -> anyhow::Result<bool>;
}

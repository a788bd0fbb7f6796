use std::sync::Arc;

use async_trait::async_trait;
use backend_domain::ports::{EntitlementRepository, HealthCheckService, RedemptionLogRepository};

pub struct DefaultHealthService {
    entitlements: Arc<dyn EntitlementRepository>,
    redemption_log: Arc<dyn RedemptionLogRepository>,
}

impl DefaultHealthService {
    pub fn new(
        entitlements: Arc<dyn EntitlementRepository>,
        redemption_log: Arc<dyn RedemptionLogRepository>,
    ) -> Self {
        Self {
            entitlements,
            redemption_log,
        }
    }
}

#[async_trait]
impl HealthCheckService for DefaultHealthService {
    async fn check_store(&self) -> anyhow::Result<bool> {
        self.entitlements.ping().await.map(|_| true)
    }

    async fn check_redemption_log(&self) -> anyhow::Result<bool> {
        self.redemption_log.ping().await.map(|_| true)
    }
}

use std::sync::Arc;

use backend_domain::ports::{
    Clock,
    ConfigRepository,
    EntitlementRepository,
    HealthCheckService,
    ParticipantDirectory,
    RedemptionLogRepository,
    ScheduleRepository,
    StatsRepository,
};
use backend_domain::{EventCatalogEntry, RuntimeConfig};
use tokio::sync::RwLock;

use crate::{Metrics, PostCommitHooks, ReadCache};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub entitlements: Arc<dyn EntitlementRepository>,
    pub stats: Arc<dyn StatsRepository>,
    pub redemption_log: Arc<dyn RedemptionLogRepository>,
    pub schedules: Arc<dyn ScheduleRepository>,
    pub participants: Arc<dyn ParticipantDirectory>,
    pub config_repo: Arc<dyn ConfigRepository>,
    pub clock: Arc<dyn Clock>,
    pub health: Arc<dyn HealthCheckService>,
    pub event_catalog: Arc<RwLock<Vec<EventCatalogEntry>>>,
    pub hooks: Arc<PostCommitHooks>,
    pub cache: Arc<ReadCache>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub fn period(&self) -> &str {
        &self.config.period
    }
}

// Post-commit side effects.
// Run strictly after an entitlement commit succeeded. Each hook is isolated:
// its error is logged and counted, never returned, and never stops the hooks
// after it.

use std::sync::Arc;

use async_trait::async_trait;
use backend_domain::ports::{Clock, RedemptionLogRepository, StatsRepository};
use backend_domain::{EntitlementKey, EntitlementRecord, RedemptionLogEntry, StatsDelta};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{Metrics, ReadCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Seeded,
    MetadataPatched,
    Redeemed { applied: u32 },
    RedeemedSet { redeemed: bool },
    FinalizedSet { finalized: bool },
    QuantitySet,
    SessionReopened,
    Removed,
}

#[derive(Debug, Clone)]
pub struct CommittedChange {
    pub key: EntitlementKey,
    /// Store version of the commit.
    pub version: u64,
    pub action: ChangeAction,
    pub delta: StatsDelta,
    /// State after the commit; `None` once the record is removed.
    pub record: Option<EntitlementRecord>,
    pub committed_at: DateTime<Utc>,
}

#[async_trait]
pub trait PostCommitHook: Send + Sync {
    fn name(&self) -> &'static str;
    async fn on_commit(&self, change: &CommittedChange) -> anyhow::Result<()>;
}

pub struct PostCommitHooks {
    hooks: Vec<Arc<dyn PostCommitHook>>,
    metrics: Arc<Metrics>,
}

impl PostCommitHooks {
    pub fn new(hooks: Vec<Arc<dyn PostCommitHook>>, metrics: Arc<Metrics>) -> Self {
        Self { hooks, metrics }
    }

    /// Stats, then audit log, then cache invalidation.
    pub fn standard(
        stats: Arc<dyn StatsRepository>,
        redemption_log: Arc<dyn RedemptionLogRepository>,
        cache: Arc<ReadCache>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self::new(
            vec![
                Arc::new(StatsHook::new(stats, clock)) as Arc<dyn PostCommitHook>,
                Arc::new(RedemptionLogHook::new(redemption_log)),
                Arc::new(CacheInvalidationHook::new(cache)),
            ],
            metrics,
        )
    }

    pub async fn dispatch(&self, change: &CommittedChange) {
        for hook in &self.hooks {
            if let Err(err) = hook.on_commit(change).await {
                self.metrics.record_side_effect_failure();
                warn!(
                    hook = hook.name(),
                    key = %change.key,
                    "post-commit side effect failed: {:#}",
                    err
                );
            }
        }
    }
}

/// Applies the commit's delta to the aggregate counters.
pub struct StatsHook {
    stats: Arc<dyn StatsRepository>,
    clock: Arc<dyn Clock>,
}

impl StatsHook {
    pub fn new(stats: Arc<dyn StatsRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { stats, clock }
    }
}

#[async_trait]
impl PostCommitHook for StatsHook {
    fn name(&self) -> &'static str {
        "stats"
    }

    async fn on_commit(&self, change: &CommittedChange) -> anyhow::Result<()> {
        if change.delta.is_zero() {
            return Ok(());
        }
        let scope = change.key.scope();
        let now = self.clock.now();
        self.stats.ensure(&scope, now).await?;
        let updated = self
            .stats
            .increment(&scope, change.delta, change.version, now)
            .await?;
        debug!(
            key = %change.key,
            eligible = updated.total_eligible_adults,
            consumed = updated.total_consumed_adults,
            participants = updated.participants,
            "event stats incremented"
        );
        Ok(())
    }
}

/// Writes one audit row per redemption that let at least one adult in.
pub struct RedemptionLogHook {
    redemption_log: Arc<dyn RedemptionLogRepository>,
}

impl RedemptionLogHook {
    pub fn new(redemption_log: Arc<dyn RedemptionLogRepository>) -> Self {
        Self { redemption_log }
    }
}

#[async_trait]
impl PostCommitHook for RedemptionLogHook {
    fn name(&self) -> &'static str {
        "redemption_log"
    }

    async fn on_commit(&self, change: &CommittedChange) -> anyhow::Result<()> {
        let ChangeAction::Redeemed { applied } = change.action else {
            return Ok(());
        };
        let Some(record) = change.record.as_ref() else {
            return Ok(());
        };
        if applied == 0 {
            return Ok(());
        }
        let entry = RedemptionLogEntry {
            id: Uuid::new_v4(),
            period: change.key.period.clone(),
            participant_id: change.key.participant_id.clone(),
            event_key: change.key.event_key.clone(),
            count: applied,
            at: change.committed_at,
            participant_name: record.participant_name.clone(),
            event_name: record.event_name.clone(),
            quantity: record.quantity,
            redeemed_after: record.redeemed,
        };
        self.redemption_log.append(&entry).await
    }
}

pub struct CacheInvalidationHook {
    cache: Arc<ReadCache>,
}

impl CacheInvalidationHook {
    pub fn new(cache: Arc<ReadCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl PostCommitHook for CacheInvalidationHook {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn on_commit(&self, change: &CommittedChange) -> anyhow::Result<()> {
        self.cache.invalidate_event(&change.key.scope()).await;
        Ok(())
    }
}

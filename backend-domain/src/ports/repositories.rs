use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{
    AggregateStats,
    EntitlementRecord,
    EventCatalogEntry,
    Participant,
    RedemptionLogEntry,
    ScheduleWindow,
};
use crate::value_objects::{EntitlementKey, EventKey, EventScope, ParticipantId, StatsDelta};

/// A document together with the store version it was read at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { version: u64 },
    /// The document changed (or appeared/disappeared) since it was read.
    Conflict,
}

/// Transactional document store for entitlement records.
///
/// `commit` is a compare-and-swap on a single document: it applies `next`
/// only when the stored version still equals `expected_version` (`None`
/// meaning "must be absent"). `next = None` deletes the document. Versions
/// are never reused for a key, so a delete followed by a re-create still
/// conflicts with readers of the old document.
#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    async fn get(&self, key: &EntitlementKey) -> anyhow::Result<Option<Versioned<EntitlementRecord>>>;
    async fn commit(
        &self,
        key: &EntitlementKey,
        expected_version: Option<u64>,
        next: Option<EntitlementRecord>,
    ) -> anyhow::Result<CommitOutcome>;
    async fn list_for_event(
        &self,
        period: &str,
        event_key: &EventKey,
    ) -> anyhow::Result<Vec<EntitlementRecord>>;
    async fn list_for_participant(
        &self,
        period: &str,
        participant_id: &ParticipantId,
    ) -> anyhow::Result<Vec<EntitlementRecord>>;
    async fn ping(&self) -> anyhow::Result<()>;
}

/// Result of recomputing one event's counters from its records.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRebuild {
    pub previous: Option<AggregateStats>,
    pub stats: AggregateStats,
    pub records: usize,
}

/// Per-event counters. Increments are atomic per call but not transactional
/// with entitlement commits.
///
/// `commit_version` is the entitlement commit that produced the delta. A
/// rebuild covers every commit up to the store version it ran at, so later
/// increments for those commits are dropped instead of counted twice.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn ensure(&self, scope: &EventScope, now: DateTime<Utc>) -> anyhow::Result<()>;
    async fn get(&self, scope: &EventScope) -> anyhow::Result<Option<AggregateStats>>;
    async fn increment(
        &self,
        scope: &EventScope,
        delta: StatsDelta,
        commit_version: u64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<AggregateStats>;
    async fn overwrite(&self, stats: AggregateStats) -> anyhow::Result<()>;
    /// Recomputes the counters from the entitlement records and replaces the
    /// stored ones, with no commit or increment in between.
    async fn rebuild(&self, scope: &EventScope, now: DateTime<Utc>) -> anyhow::Result<StatsRebuild>;
}

/// Append-only audit trail.
#[async_trait]
pub trait RedemptionLogRepository: Send + Sync {
    async fn append(&self, entry: &RedemptionLogEntry) -> anyhow::Result<()>;
    async fn list_for_event(&self, scope: &EventScope) -> anyhow::Result<Vec<RedemptionLogEntry>>;
    async fn delete_for_participant_event(
        &self,
        scope: &EventScope,
        participant_id: &ParticipantId,
    ) -> anyhow::Result<u64>;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn get_schedule(&self, scope: &EventScope) -> anyhow::Result<Option<ScheduleWindow>>;
    async fn put_schedule(&self, scope: &EventScope, window: &ScheduleWindow) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    async fn lookup(&self, participant_id: &ParticipantId) -> anyhow::Result<Option<Participant>>;
    async fn upsert(&self, participant: &Participant) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn load_event_catalog(&self, path: &str) -> anyhow::Result<Vec<EventCatalogEntry>>;
    async fn save_event_catalog(&self, path: &str, entries: &[EventCatalogEntry]) -> anyhow::Result<()>;
}

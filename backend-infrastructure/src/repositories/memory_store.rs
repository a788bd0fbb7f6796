// In-process document store
// Entitlements, per-event stats and schedules behind one lock, with
// compare-and-swap commits and an optional JSON snapshot on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use backend_domain::{
    AggregateStats,
    CommitOutcome,
    EntitlementKey,
    EntitlementRecord,
    EntitlementRepository,
    EventKey,
    EventScope,
    ParticipantId,
    ScheduleRepository,
    ScheduleWindow,
    StatsDelta,
    StatsRebuild,
    StatsRepository,
    Versioned,
};

use crate::utils::write_file_atomic;

#[derive(Default)]
struct StoreState {
    /// Shared by every key so a version is never handed out twice.
    last_version: u64,
    entitlements: HashMap<EntitlementKey, Versioned<EntitlementRecord>>,
    stats: HashMap<EventScope, AggregateStats>,
    schedules: HashMap<EventScope, ScheduleWindow>,
    /// Store version each event's stats were last rebuilt at.
    rebuilt_through: HashMap<EventScope, u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    last_version: u64,
    #[serde(default)]
    entitlements: Vec<Versioned<EntitlementRecord>>,
    #[serde(default)]
    stats: Vec<AggregateStats>,
    #[serde(default)]
    schedules: Vec<ScheduleRow>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScheduleRow {
    period: String,
    event_key: EventKey,
    window: ScheduleWindow,
}

impl From<Snapshot> for StoreState {
    fn from(snapshot: Snapshot) -> Self {
        let mut state = StoreState {
            last_version: snapshot.last_version,
            ..StoreState::default()
        };
        for doc in snapshot.entitlements {
            state.last_version = state.last_version.max(doc.version);
            state.entitlements.insert(doc.value.key(), doc);
        }
        for stats in snapshot.stats {
            let scope = EventScope::new(stats.period.clone(), stats.event_key.clone());
            state.stats.insert(scope, stats);
        }
        for row in snapshot.schedules {
            state
                .schedules
                .insert(EventScope::new(row.period, row.event_key), row.window);
        }
        state
    }
}

impl StoreState {
    fn snapshot(&self) -> Snapshot {
        let mut entitlements: Vec<_> = self.entitlements.values().cloned().collect();
        entitlements.sort_by(|a, b| a.value.key().to_string().cmp(&b.value.key().to_string()));
        let mut stats: Vec<_> = self.stats.values().cloned().collect();
        stats.sort_by(|a, b| (&a.period, &a.event_key).cmp(&(&b.period, &b.event_key)));
        let mut schedules: Vec<_> = self
            .schedules
            .iter()
            .map(|(scope, window)| ScheduleRow {
                period: scope.period.clone(),
                event_key: scope.event_key.clone(),
                window: window.clone(),
            })
            .collect();
        schedules.sort_by(|a, b| (&a.period, &a.event_key).cmp(&(&b.period, &b.event_key)));
        Snapshot {
            last_version: self.last_version,
            entitlements,
            stats,
            schedules,
        }
    }

    fn stats_entry(&mut self, scope: &EventScope, now: DateTime<Utc>) -> &mut AggregateStats {
        self.stats
            .entry(scope.clone())
            .or_insert_with(|| AggregateStats::zeroed(scope.period.clone(), scope.event_key.clone(), now))
    }
}

pub struct MemoryDocumentStore {
    state: RwLock<StoreState>,
    snapshot_path: Option<PathBuf>,
    persist_lock: Mutex<()>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            snapshot_path: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Opens a store backed by a snapshot file, loading it when present.
    pub async fn open(snapshot_path: impl Into<PathBuf>) -> Result<Self> {
        let path = snapshot_path.into();
        let state = if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            let snapshot: Snapshot = serde_json::from_str(&content)?;
            info!(
                path = %path.display(),
                entitlements = snapshot.entitlements.len(),
                "document store snapshot loaded"
            );
            StoreState::from(snapshot)
        } else {
            StoreState::default()
        };
        Ok(Self {
            state: RwLock::new(state),
            snapshot_path: Some(path),
            persist_lock: Mutex::new(()),
        })
    }

    /// Writes the current state to the snapshot file. A failed write is only
    /// logged: the in-memory commit already happened and must not be retried.
    async fn persist(&self) {
        let Some(path) = self.snapshot_path.as_ref() else {
            return;
        };
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.state.read().await.snapshot();
        if let Err(err) = write_snapshot(path, &snapshot).await {
            warn!(path = %path.display(), "document store snapshot failed: {:#}", err);
        }
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let content = serde_json::to_vec(snapshot)?;
    write_file_atomic(path, content).await
}

#[async_trait]
impl EntitlementRepository for MemoryDocumentStore {
    async fn get(&self, key: &EntitlementKey) -> Result<Option<Versioned<EntitlementRecord>>> {
        Ok(self.state.read().await.entitlements.get(key).cloned())
    }

    async fn commit(
        &self,
        key: &EntitlementKey,
        expected_version: Option<u64>,
        next: Option<EntitlementRecord>,
    ) -> Result<CommitOutcome> {
        let outcome = {
            let mut state = self.state.write().await;
            let stored_version = state.entitlements.get(key).map(|doc| doc.version);
            if stored_version != expected_version {
                debug!(key = %key, ?stored_version, ?expected_version, "stale commit rejected");
                return Ok(CommitOutcome::Conflict);
            }
            state.last_version += 1;
            let version = state.last_version;
            match next {
                Some(value) => {
                    state
                        .entitlements
                        .insert(key.clone(), Versioned { version, value });
                }
                None => {
                    state.entitlements.remove(key);
                }
            }
            CommitOutcome::Committed { version }
        };
        self.persist().await;
        Ok(outcome)
    }

    async fn list_for_event(&self, period: &str, event_key: &EventKey) -> Result<Vec<EntitlementRecord>> {
        let state = self.state.read().await;
        Ok(state
            .entitlements
            .iter()
            .filter(|(key, _)| key.period == period && &key.event_key == event_key)
            .map(|(_, doc)| doc.value.clone())
            .collect())
    }

    async fn list_for_participant(
        &self,
        period: &str,
        participant_id: &ParticipantId,
    ) -> Result<Vec<EntitlementRecord>> {
        let state = self.state.read().await;
        Ok(state
            .entitlements
            .iter()
            .filter(|(key, _)| key.period == period && &key.participant_id == participant_id)
            .map(|(_, doc)| doc.value.clone())
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        let _ = self.state.read().await;
        Ok(())
    }
}

#[async_trait]
impl StatsRepository for MemoryDocumentStore {
    async fn ensure(&self, scope: &EventScope, now: DateTime<Utc>) -> Result<()> {
        let created = {
            let mut state = self.state.write().await;
            if state.stats.contains_key(scope) {
                false
            } else {
                state.stats_entry(scope, now);
                true
            }
        };
        if created {
            self.persist().await;
        }
        Ok(())
    }

    async fn get(&self, scope: &EventScope) -> Result<Option<AggregateStats>> {
        Ok(self.state.read().await.stats.get(scope).cloned())
    }

    async fn increment(
        &self,
        scope: &EventScope,
        delta: StatsDelta,
        commit_version: u64,
        now: DateTime<Utc>,
    ) -> Result<AggregateStats> {
        let (updated, applied) = {
            let mut state = self.state.write().await;
            let covered = state
                .rebuilt_through
                .get(scope)
                .is_some_and(|&through| commit_version <= through);
            let stats = state.stats_entry(scope, now);
            if !covered {
                stats.apply(delta, now);
            }
            (stats.clone(), !covered)
        };
        if applied {
            self.persist().await;
        } else {
            debug!(event = %scope.event_key, commit_version, "increment already covered by rebuild");
        }
        Ok(updated)
    }

    async fn overwrite(&self, stats: AggregateStats) -> Result<()> {
        {
            let scope = EventScope::new(stats.period.clone(), stats.event_key.clone());
            self.state.write().await.stats.insert(scope, stats);
        }
        self.persist().await;
        Ok(())
    }

    async fn rebuild(&self, scope: &EventScope, now: DateTime<Utc>) -> Result<StatsRebuild> {
        let rebuild = {
            let mut state = self.state.write().await;
            let records: Vec<&EntitlementRecord> = state
                .entitlements
                .iter()
                .filter(|(key, _)| key.period == scope.period && key.event_key == scope.event_key)
                .map(|(_, doc)| &doc.value)
                .collect();
            let count = records.len();
            let stats = AggregateStats::from_records(scope.period.clone(), scope.event_key.clone(), records, now);
            let through = state.last_version;
            state.rebuilt_through.insert(scope.clone(), through);
            let previous = state.stats.insert(scope.clone(), stats.clone());
            StatsRebuild {
                previous,
                stats,
                records: count,
            }
        };
        self.persist().await;
        Ok(rebuild)
    }
}

#[async_trait]
impl ScheduleRepository for MemoryDocumentStore {
    async fn get_schedule(&self, scope: &EventScope) -> Result<Option<ScheduleWindow>> {
        Ok(self.state.read().await.schedules.get(scope).cloned())
    }

    async fn put_schedule(&self, scope: &EventScope, window: &ScheduleWindow) -> Result<()> {
        self.state
            .write()
            .await
            .schedules
            .insert(scope.clone(), window.clone());
        self.persist().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn key(pid: &str) -> EntitlementKey {
        EntitlementKey::new("2025", ParticipantId(pid.to_string()), EventKey("RB1".to_string()))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 15, 17, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn commit_requires_expected_version() {
        let store = MemoryDocumentStore::new();
        let key = key("355");
        let record = EntitlementRecord::seeded(&key, 2, now());

        let first = store.commit(&key, None, Some(record.clone())).await.expect("commit");
        let CommitOutcome::Committed { version } = first else {
            panic!("first commit conflicted");
        };
        let stale = store.commit(&key, None, Some(record.clone())).await.expect("commit");
        assert_eq!(stale, CommitOutcome::Conflict);

        let doc = EntitlementRepository::get(&store, &key).await.expect("get").expect("present");
        assert_eq!(doc.version, version);
    }

    #[tokio::test]
    async fn versions_are_not_reused_after_delete() {
        let store = MemoryDocumentStore::new();
        let key = key("355");
        let record = EntitlementRecord::seeded(&key, 2, now());

        store.commit(&key, None, Some(record.clone())).await.expect("create");
        let old = EntitlementRepository::get(&store, &key).await.expect("get").expect("present").version;
        store.commit(&key, Some(old), None).await.expect("delete");
        store.commit(&key, None, Some(record)).await.expect("recreate");

        let stale = store.commit(&key, Some(old), None).await.expect("commit");
        assert_eq!(stale, CommitOutcome::Conflict);
    }

    #[tokio::test]
    async fn increment_creates_missing_stats() {
        let store = MemoryDocumentStore::new();
        let scope = EventScope::new("2025", EventKey("RB1".to_string()));
        let stats = store
            .increment(&scope, StatsDelta::seeded(3), 1, now())
            .await
            .expect("increment");
        assert_eq!(stats.total_eligible_adults, 3);
        assert_eq!(stats.participants, 1);

        store.ensure(&scope, now()).await.expect("ensure");
        let stored = StatsRepository::get(&store, &scope).await.expect("get").expect("present");
        assert_eq!(stored.total_eligible_adults, 3);
    }

    #[tokio::test]
    async fn listing_is_scoped_by_period() {
        let store = MemoryDocumentStore::new();
        let this_year = key("355");
        let last_year = EntitlementKey::new("2024", ParticipantId("355".to_string()), EventKey("RB1".to_string()));
        store
            .commit(&this_year, None, Some(EntitlementRecord::seeded(&this_year, 2, now())))
            .await
            .expect("commit");
        store
            .commit(&last_year, None, Some(EntitlementRecord::seeded(&last_year, 2, now())))
            .await
            .expect("commit");

        let listed = store
            .list_for_event("2025", &EventKey("RB1".to_string()))
            .await
            .expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].period, "2025");
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("voucher-store-{}", uuid::Uuid::new_v4()));
        let path = dir.join("store.json");
        let key = key("355");
        let scope = key.scope();
        {
            let store = MemoryDocumentStore::open(&path).await.expect("open");
            store
                .commit(&key, None, Some(EntitlementRecord::seeded(&key, 4, now())))
                .await
                .expect("commit");
            store
                .put_schedule(&scope, &ScheduleWindow::new("2025-11-15", "19:00", "22:00"))
                .await
                .expect("schedule");
        }

        let reopened = MemoryDocumentStore::open(&path).await.expect("reopen");
        let doc = EntitlementRepository::get(&reopened, &key).await.expect("get").expect("present");
        assert_eq!(doc.value.quantity, 4);
        let window = reopened.get_schedule(&scope).await.expect("get").expect("present");
        assert_eq!(window.open_time.as_deref(), Some("19:00"));

        let recreated = reopened
            .commit(&key, Some(doc.version), Some(doc.value.clone()))
            .await
            .expect("commit");
        assert!(matches!(recreated, CommitOutcome::Committed { version } if version > doc.version));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn rebuild_drops_increments_it_already_counted() {
        let store = MemoryDocumentStore::new();
        let key = key("355");
        let scope = key.scope();
        let mut record = EntitlementRecord::seeded(&key, 3, now());
        let CommitOutcome::Committed { version: seeded } =
            store.commit(&key, None, Some(record.clone())).await.expect("seed")
        else {
            panic!("seed conflicted");
        };
        record.consumed = Some(2);
        let CommitOutcome::Committed { version: redeemed } =
            store.commit(&key, Some(seeded), Some(record)).await.expect("redeem")
        else {
            panic!("redeem conflicted");
        };

        let rebuilt = store.rebuild(&scope, now()).await.expect("rebuild");
        assert_eq!(rebuilt.previous, None);
        assert_eq!(rebuilt.records, 1);
        assert_eq!(rebuilt.stats.total_consumed_adults, 2);

        // Hooks of both commits arrive after the rebuild already saw them.
        store
            .increment(&scope, StatsDelta::seeded(3), seeded, now())
            .await
            .expect("increment");
        let stats = store
            .increment(&scope, StatsDelta::consumed(2), redeemed, now())
            .await
            .expect("increment");
        assert_eq!(stats.total_eligible_adults, 3);
        assert_eq!(stats.total_consumed_adults, 2);
        assert_eq!(stats.participants, 1);

        let later = store
            .increment(&scope, StatsDelta::consumed(1), redeemed + 1, now())
            .await
            .expect("increment");
        assert_eq!(later.total_consumed_adults, 3);
    }
}

// Read-through cache for hot dashboard reads.
// Entries expire after a TTL measured on the injected clock and are dropped
// explicitly whenever a write touches the same event. Every invalidation
// bumps the event's generation; a fill read under an older generation is
// dropped so it cannot resurrect a view from before the write.

use std::collections::HashMap;
use std::sync::Arc;

use backend_domain::ports::Clock;
use backend_domain::{AggregateStats, EntitlementRecord, EventScope, RedemptionLogEntry};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

struct Cached<V> {
    stored_at: DateTime<Utc>,
    value: V,
}

struct TtlMap<V> {
    entries: Mutex<HashMap<EventScope, Cached<V>>>,
}

impl<V: Clone> TtlMap<V> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    async fn get(&self, scope: &EventScope, now: DateTime<Utc>, ttl: Duration) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(scope) {
            Some(hit) if now - hit.stored_at < ttl => Some(hit.value.clone()),
            Some(_) => {
                entries.remove(scope);
                None
            }
            None => None,
        }
    }

    async fn put(&self, scope: &EventScope, value: V, now: DateTime<Utc>) {
        self.entries.lock().await.insert(
            scope.clone(),
            Cached {
                stored_at: now,
                value,
            },
        );
    }

    async fn invalidate(&self, scope: &EventScope) {
        self.entries.lock().await.remove(scope);
    }
}

pub struct ReadCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    generations: Mutex<HashMap<EventScope, u64>>,
    stats: TtlMap<AggregateStats>,
    log: TtlMap<Vec<RedemptionLogEntry>>,
    redeemed: TtlMap<Vec<EntitlementRecord>>,
}

impl ReadCache {
    pub fn new(ttl_seconds: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: i64::try_from(ttl_seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
            clock,
            generations: Mutex::new(HashMap::new()),
            stats: TtlMap::new(),
            log: TtlMap::new(),
            redeemed: TtlMap::new(),
        }
    }

    /// Take this before reading the store and hand it back to `put_*`.
    pub async fn generation(&self, scope: &EventScope) -> u64 {
        self.generations.lock().await.get(scope).copied().unwrap_or(0)
    }

    async fn fill<V: Clone>(&self, map: &TtlMap<V>, scope: &EventScope, value: V, generation: u64) {
        let generations = self.generations.lock().await;
        if generations.get(scope).copied().unwrap_or(0) != generation {
            debug!(event = %scope.event_key, "stale cache fill skipped");
            return;
        }
        map.put(scope, value, self.clock.now()).await;
    }

    pub async fn stats(&self, scope: &EventScope) -> Option<AggregateStats> {
        self.stats.get(scope, self.clock.now(), self.ttl).await
    }

    pub async fn put_stats(&self, scope: &EventScope, stats: AggregateStats, generation: u64) {
        self.fill(&self.stats, scope, stats, generation).await;
    }

    pub async fn log(&self, scope: &EventScope) -> Option<Vec<RedemptionLogEntry>> {
        self.log.get(scope, self.clock.now(), self.ttl).await
    }

    pub async fn put_log(&self, scope: &EventScope, entries: Vec<RedemptionLogEntry>, generation: u64) {
        self.fill(&self.log, scope, entries, generation).await;
    }

    pub async fn redeemed(&self, scope: &EventScope) -> Option<Vec<EntitlementRecord>> {
        self.redeemed.get(scope, self.clock.now(), self.ttl).await
    }

    pub async fn put_redeemed(&self, scope: &EventScope, records: Vec<EntitlementRecord>, generation: u64) {
        self.fill(&self.redeemed, scope, records, generation).await;
    }

    /// Drops every cached view of one event.
    pub async fn invalidate_event(&self, scope: &EventScope) {
        let mut generations = self.generations.lock().await;
        *generations.entry(scope.clone()).or_insert(0) += 1;
        self.stats.invalidate(scope).await;
        self.log.invalidate(scope).await;
        self.redeemed.invalidate(scope).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use chrono::TimeZone;

    use super::*;
    use backend_domain::EventKey;

    struct ManualClock(StdMutex<DateTime<Utc>>);

    impl ManualClock {
        fn advance(&self, seconds: i64) {
            let mut now = self.0.lock().unwrap();
            *now += Duration::seconds(seconds);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn setup() -> (Arc<ManualClock>, ReadCache, EventScope) {
        let start = Utc.with_ymd_and_hms(2025, 11, 19, 18, 0, 0).unwrap();
        let clock = Arc::new(ManualClock(StdMutex::new(start)));
        let cache = ReadCache::new(60, clock.clone());
        let scope = EventScope::new("2025", EventKey("COCKTAIL".to_string()));
        (clock, cache, scope)
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let (clock, cache, scope) = setup();
        let stats = AggregateStats::zeroed("2025", scope.event_key.clone(), clock.now());
        let generation = cache.generation(&scope).await;
        cache.put_stats(&scope, stats.clone(), generation).await;

        clock.advance(59);
        assert_eq!(cache.stats(&scope).await, Some(stats));
        clock.advance(1);
        assert_eq!(cache.stats(&scope).await, None);
    }

    #[tokio::test]
    async fn invalidation_drops_all_views_of_event() {
        let (clock, cache, scope) = setup();
        let other = EventScope::new("2025", EventKey("RB1".to_string()));
        cache
            .put_stats(&scope, AggregateStats::zeroed("2025", scope.event_key.clone(), clock.now()), 0)
            .await;
        cache.put_log(&scope, Vec::new(), 0).await;
        cache.put_log(&other, Vec::new(), 0).await;

        cache.invalidate_event(&scope).await;
        assert!(cache.stats(&scope).await.is_none());
        assert!(cache.log(&scope).await.is_none());
        assert!(cache.log(&other).await.is_some());
    }

    #[tokio::test]
    async fn fill_read_before_invalidation_is_dropped() {
        let (clock, cache, scope) = setup();
        let before_write = cache.generation(&scope).await;
        let stale = AggregateStats::zeroed("2025", scope.event_key.clone(), clock.now());

        // A commit lands while the listing is still being read.
        cache.invalidate_event(&scope).await;
        cache.put_stats(&scope, stale.clone(), before_write).await;
        assert!(cache.stats(&scope).await.is_none());

        let current = cache.generation(&scope).await;
        cache.put_stats(&scope, stale.clone(), current).await;
        assert_eq!(cache.stats(&scope).await, Some(stale));
    }
}

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::RwLock;

use backend_application::{AppState, Metrics, PostCommitHooks, ReadCache};
use backend_domain::{
    Clock,
    EventCatalogEntry,
    EventKey,
    RedemptionLogRepository,
    RuntimeConfig,
    ScheduleWindow,
};
use backend_infrastructure::{
    ConfigFileRepository,
    DefaultHealthService,
    FileParticipantDirectory,
    MemoryDocumentStore,
    MemoryRedemptionLog,
};

pub const PERIOD: &str = "2025";

pub struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }

    pub fn advance(&self, seconds: i64) {
        *self.0.lock().unwrap() += Duration::seconds(seconds);
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Festival wall clock in Jerusalem (UTC+2 in November).
pub fn local(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, day, hour, minute, 0).unwrap() - Duration::hours(2)
}

pub fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: None,
        period: PERIOD.to_string(),
        timezone: chrono_tz::Asia::Jerusalem,
        cache_ttl_seconds: 60,
        transaction_max_attempts: 8,
        transaction_backoff_ms: 1,
        event_catalog_path: std::env::temp_dir()
            .join("voucher-test-events.yaml")
            .to_string_lossy()
            .to_string(),
        max_body_bytes: 1024 * 1024,
        request_timeout_seconds: 5,
    }
}

pub fn catalog() -> Vec<EventCatalogEntry> {
    vec![
        EventCatalogEntry {
            event_key: EventKey("RB1".to_string()),
            display_name: "Rooftop bar".to_string(),
            description: None,
            default_schedule: Some(ScheduleWindow::new("2025-11-15", "19:00", "22:00")),
        },
        EventCatalogEntry {
            event_key: EventKey("SOUPS".to_string()),
            display_name: "Soup night".to_string(),
            description: Some("Late kitchen".to_string()),
            default_schedule: Some(ScheduleWindow::new("2025-11-17", "23:30", "02:00")),
        },
        EventCatalogEntry {
            event_key: EventKey("COCKTAIL".to_string()),
            display_name: "Cocktail party".to_string(),
            description: None,
            default_schedule: None,
        },
    ]
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryDocumentStore>,
    pub clock: Arc<TestClock>,
}

pub fn harness() -> Harness {
    harness_with(runtime_config(), Arc::new(MemoryRedemptionLog::new()))
}

pub fn harness_with(config: RuntimeConfig, redemption_log: Arc<dyn RedemptionLogRepository>) -> Harness {
    let store = Arc::new(MemoryDocumentStore::new());
    let clock = Arc::new(TestClock::at(local(15, 20, 0)));
    let metrics = Arc::new(Metrics::default());
    let cache = Arc::new(ReadCache::new(config.cache_ttl_seconds, clock.clone()));
    let hooks = Arc::new(PostCommitHooks::standard(
        store.clone(),
        redemption_log.clone(),
        cache.clone(),
        clock.clone(),
        metrics.clone(),
    ));
    let state = AppState {
        config,
        entitlements: store.clone(),
        stats: store.clone(),
        redemption_log: redemption_log.clone(),
        schedules: store.clone(),
        participants: Arc::new(FileParticipantDirectory::in_memory()),
        config_repo: Arc::new(ConfigFileRepository::new()),
        clock: clock.clone(),
        health: Arc::new(DefaultHealthService::new(store.clone(), redemption_log)),
        event_catalog: Arc::new(RwLock::new(catalog())),
        hooks,
        cache,
        metrics,
    };
    Harness { state, store, clock }
}

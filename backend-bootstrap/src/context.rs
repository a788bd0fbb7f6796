use std::sync::Arc;

use anyhow::Result;
use clickhouse::Client;
use tokio::sync::RwLock;
use tracing::{info, warn};

use backend_application::{AppState, Metrics, PostCommitHooks, ReadCache};
use backend_domain::{
    Clock,
    ConfigRepository,
    EventCatalogEntry,
    ParticipantDirectory,
    RedemptionLogRepository,
    RuntimeConfig,
};
use backend_infrastructure::{
    AppConfig,
    ClickhouseRedemptionLog,
    ConfigFileRepository,
    DefaultHealthService,
    FileParticipantDirectory,
    LogBackend,
    MemoryDocumentStore,
    MemoryRedemptionLog,
    SystemClock,
};

pub struct AppContext {
    pub state: AppState,
}

/// Storage adapters the state is assembled from.
pub struct Adapters {
    pub store: Arc<MemoryDocumentStore>,
    pub redemption_log: Arc<dyn RedemptionLogRepository>,
    pub participants: Arc<dyn ParticipantDirectory>,
    pub clock: Arc<dyn Clock>,
}

impl Adapters {
    /// Everything in process memory, wall clock time.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryDocumentStore::new()),
            redemption_log: Arc::new(MemoryRedemptionLog::new()),
            participants: Arc::new(FileParticipantDirectory::in_memory()),
            clock: Arc::new(SystemClock),
        }
    }
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        Self::from_config(&config).await
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config()?;

        let store = match config.store_snapshot_path.as_deref() {
            Some(path) => Arc::new(MemoryDocumentStore::open(path).await?),
            None => {
                warn!("store_snapshot_path not set, entitlements live in memory only");
                Arc::new(MemoryDocumentStore::new())
            }
        };

        let redemption_log: Arc<dyn RedemptionLogRepository> = match config.log_backend {
            LogBackend::Memory => Arc::new(MemoryRedemptionLog::new()),
            LogBackend::Clickhouse => {
                let db_config = config.to_clickhouse_config();
                let mut clickhouse = Client::default()
                    .with_url(&db_config.url)
                    .with_database(&db_config.database);
                if let Some(user) = &db_config.user {
                    clickhouse = clickhouse.with_user(user);
                }
                if let Some(password) = &db_config.password {
                    clickhouse = clickhouse.with_password(password);
                }
                let log = ClickhouseRedemptionLog::new(clickhouse, db_config.database.clone());
                log.ensure_schema().await?;
                Arc::new(log)
            }
        };

        let participants: Arc<dyn ParticipantDirectory> = match config.participants_path.as_deref() {
            Some(path) => Arc::new(FileParticipantDirectory::load(path).await?),
            None => Arc::new(FileParticipantDirectory::in_memory()),
        };

        let config_repo = Arc::new(ConfigFileRepository::new());
        let catalog = config_repo
            .load_event_catalog(&runtime_config.event_catalog_path)
            .await
            .unwrap_or_else(|err| {
                warn!("event catalog not loaded: {:#}", err);
                Vec::new()
            });
        info!(
            period = %runtime_config.period,
            timezone = %runtime_config.timezone,
            events = catalog.len(),
            log_backend = ?config.log_backend,
            "voucher backend configured"
        );

        let adapters = Adapters {
            store,
            redemption_log,
            participants,
            clock: Arc::new(SystemClock),
        };
        Ok(Self::assemble(runtime_config, adapters, catalog))
    }

    pub fn assemble(config: RuntimeConfig, adapters: Adapters, catalog: Vec<EventCatalogEntry>) -> Self {
        let Adapters {
            store,
            redemption_log,
            participants,
            clock,
        } = adapters;
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
            participants,
            config_repo: Arc::new(ConfigFileRepository::new()),
            clock,
            health: Arc::new(DefaultHealthService::new(store, redemption_log)),
            event_catalog: Arc::new(RwLock::new(catalog)),
            hooks,
            cache,
            metrics,
        };
        Self { state }
    }
}

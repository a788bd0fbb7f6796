use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::Datelike;
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::RuntimeConfig;

use crate::config::validation::{parse_timezone, validate_period};

pub const DEFAULT_TIMEZONE: &str = "Asia/Jerusalem";
pub const MAX_CACHE_TTL_SECONDS: u64 = 86_400;
pub const MAX_TRANSACTION_ATTEMPTS: u32 = 100;
pub const MAX_TRANSACTION_BACKOFF_MS: u64 = 10_000;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogBackend {
    Memory,
    Clickhouse,
}

impl std::str::FromStr for LogBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(LogBackend::Memory),
            "clickhouse" => Ok(LogBackend::Clickhouse),
            other => Err(anyhow!("unknown log_backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClickhouseConfig {
    pub url: String,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub period: String,
    pub timezone: String,
    pub cache_ttl_seconds: u64,
    pub transaction_max_attempts: u32,
    pub transaction_backoff_ms: u64,
    pub store_snapshot_path: Option<String>,
    pub log_backend: LogBackend,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
    pub participants_path: Option<String>,
    pub event_catalog_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3234".to_string(),
            api_token: None,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
            period: chrono::Utc::now().year().to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            cache_ttl_seconds: 60,
            transaction_max_attempts: 8,
            transaction_backoff_ms: 5,
            store_snapshot_path: None,
            log_backend: LogBackend::Memory,
            clickhouse_url: "http://127.0.0.1:8123".to_string(),
            clickhouse_database: "vouchers".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            participants_path: None,
            event_catalog_path: "./events.yaml".to_string(),
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("VOUCHER_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::from_toml(&content)?
        } else {
            warn!("config.toml not found, using defaults");
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        self.api_token = non_blank(self.api_token.take());
        self.clickhouse_user = non_blank(self.clickhouse_user.take());
        self.clickhouse_password = non_blank(self.clickhouse_password.take());
        self.store_snapshot_path = non_blank(self.store_snapshot_path.take());
        self.participants_path = non_blank(self.participants_path.take());
        self.period = self.period.trim().to_string();
        self.timezone = self.timezone.trim().to_string();
        if self.timezone.is_empty() {
            self.timezone = DEFAULT_TIMEZONE.to_string();
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.event_catalog_path = resolve_path(base, &self.event_catalog_path);
        self.store_snapshot_path = self
            .store_snapshot_path
            .as_deref()
            .map(|path| resolve_path(base, path));
        self.participants_path = self
            .participants_path
            .as_deref()
            .map(|path| resolve_path(base, path));
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.transaction_max_attempts == 0 {
            return Err(anyhow!("transaction_max_attempts must be greater than 0"));
        }
        if self.transaction_max_attempts > MAX_TRANSACTION_ATTEMPTS {
            return Err(anyhow!(
                "transaction_max_attempts must be at most {}",
                MAX_TRANSACTION_ATTEMPTS
            ));
        }
        if self.transaction_backoff_ms > MAX_TRANSACTION_BACKOFF_MS {
            return Err(anyhow!(
                "transaction_backoff_ms must be at most {}",
                MAX_TRANSACTION_BACKOFF_MS
            ));
        }
        if self.cache_ttl_seconds > MAX_CACHE_TTL_SECONDS {
            return Err(anyhow!("cache_ttl_seconds must be at most {}", MAX_CACHE_TTL_SECONDS));
        }
        validate_period(&self.period)?;
        parse_timezone(&self.timezone)?;
        if self.log_backend == LogBackend::Clickhouse && self.clickhouse_url.trim().is_empty() {
            return Err(anyhow!("clickhouse_url is required for the clickhouse log backend"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> Result<RuntimeConfig> {
        Ok(RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            period: self.period.clone(),
            timezone: parse_timezone(&self.timezone)?,
            cache_ttl_seconds: self.cache_ttl_seconds,
            transaction_max_attempts: self.transaction_max_attempts,
            transaction_backoff_ms: self.transaction_backoff_ms,
            event_catalog_path: self.event_catalog_path.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        })
    }

    pub fn to_clickhouse_config(&self) -> ClickhouseConfig {
        ClickhouseConfig {
            url: self.clickhouse_url.clone(),
            database: self.clickhouse_database.clone(),
            user: self.clickhouse_user.clone(),
            password: self.clickhouse_password.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("VOUCHER_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("VOUCHER_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("VOUCHER_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("VOUCHER_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("VOUCHER_PERIOD") {
            self.period = value;
        }
        if let Ok(value) = env::var("VOUCHER_TIMEZONE") {
            self.timezone = value;
        }
        if let Ok(value) = env::var("VOUCHER_CACHE_TTL_SECONDS") {
            self.cache_ttl_seconds = value.parse().unwrap_or(self.cache_ttl_seconds);
        }
        if let Ok(value) = env::var("VOUCHER_TRANSACTION_MAX_ATTEMPTS") {
            self.transaction_max_attempts = value.parse().unwrap_or(self.transaction_max_attempts);
        }
        if let Ok(value) = env::var("VOUCHER_TRANSACTION_BACKOFF_MS") {
            self.transaction_backoff_ms = value.parse().unwrap_or(self.transaction_backoff_ms);
        }
        if let Ok(value) = env::var("VOUCHER_STORE_SNAPSHOT_PATH") {
            self.store_snapshot_path = Some(value);
        }
        if let Ok(value) = env::var("VOUCHER_LOG_BACKEND") {
            match value.parse() {
                Ok(backend) => self.log_backend = backend,
                Err(err) => warn!("ignoring VOUCHER_LOG_BACKEND: {}", err),
            }
        }
        if let Ok(value) = env::var("VOUCHER_CLICKHOUSE_URL") {
            self.clickhouse_url = value;
        }
        if let Ok(value) = env::var("VOUCHER_CLICKHOUSE_DATABASE") {
            self.clickhouse_database = value;
        }
        if let Ok(value) = env::var("VOUCHER_CLICKHOUSE_USER") {
            self.clickhouse_user = Some(value);
        }
        if let Ok(value) = env::var("VOUCHER_CLICKHOUSE_PASSWORD") {
            self.clickhouse_password = Some(value);
        }
        if let Ok(value) = env::var("VOUCHER_PARTICIPANTS_PATH") {
            self.participants_path = Some(value);
        }
        if let Ok(value) = env::var("VOUCHER_EVENT_CATALOG_PATH") {
            self.event_catalog_path = value;
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|item| !item.trim().is_empty())
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let mut config = AppConfig::default();
        config.normalize();
        config.validate().expect("defaults validate");
        let runtime = config.to_runtime_config().expect("runtime config");
        assert_eq!(runtime.timezone, chrono_tz::Asia::Jerusalem);
        assert_eq!(runtime.cache_ttl_seconds, 60);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = AppConfig::from_toml(
            r#"
period = "2025"
timezone = "Europe/Berlin"
log_backend = "clickhouse"
transaction_max_attempts = 3
"#,
        )
        .expect("parse");
        assert_eq!(config.period, "2025");
        assert_eq!(config.log_backend, LogBackend::Clickhouse);
        assert_eq!(config.transaction_max_attempts, 3);
        assert_eq!(config.cache_ttl_seconds, 60);
        let runtime = config.to_runtime_config().expect("runtime config");
        assert_eq!(runtime.timezone, chrono_tz::Europe::Berlin);
    }

    #[test]
    fn blank_secrets_are_dropped() {
        let mut config = AppConfig {
            api_token: Some("  ".to_string()),
            clickhouse_password: Some(String::new()),
            ..AppConfig::default()
        };
        config.normalize();
        assert!(config.api_token.is_none());
        assert!(config.clickhouse_password.is_none());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let bad_tz = AppConfig {
            timezone: "Nowhere/Land".to_string(),
            ..AppConfig::default()
        };
        assert!(bad_tz.validate().is_err());

        let bad_attempts = AppConfig {
            transaction_max_attempts: 0,
            ..AppConfig::default()
        };
        assert!(bad_attempts.validate().is_err());
    }

    #[test]
    fn oversized_timing_values_fail_validation() {
        let huge_ttl = AppConfig {
            cache_ttl_seconds: 10_000_000_000_000_000,
            ..AppConfig::default()
        };
        assert!(huge_ttl.validate().is_err());

        let huge_backoff = AppConfig {
            transaction_backoff_ms: u64::MAX,
            ..AppConfig::default()
        };
        assert!(huge_backoff.validate().is_err());

        let edge = AppConfig {
            cache_ttl_seconds: MAX_CACHE_TTL_SECONDS,
            transaction_backoff_ms: MAX_TRANSACTION_BACKOFF_MS,
            transaction_max_attempts: MAX_TRANSACTION_ATTEMPTS,
            ..AppConfig::default()
        };
        edge.validate().expect("limits are inclusive");
    }

    #[test]
    fn relative_paths_follow_config_dir() {
        let mut config = AppConfig {
            store_snapshot_path: Some("data/store.json".to_string()),
            ..AppConfig::default()
        };
        config.resolve_paths(Some(Path::new("/etc/voucher")));
        assert_eq!(config.event_catalog_path, "/etc/voucher/./events.yaml");
        assert_eq!(
            config.store_snapshot_path.as_deref(),
            Some("/etc/voucher/data/store.json")
        );
    }
}

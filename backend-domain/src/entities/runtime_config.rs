use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub period: String,
    pub timezone: Tz,
    pub cache_ttl_seconds: u64,
    pub transaction_max_attempts: u32,
    pub transaction_backoff_ms: u64,
    pub event_catalog_path: String,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

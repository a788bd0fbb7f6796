use axum::http::HeaderMap;

use backend_domain::RuntimeConfig;

/// Every route except liveness/readiness requires the bearer token when one
/// is configured.
pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn config(token: Option<&str>) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            api_token: token.map(str::to_string),
            period: "2025".to_string(),
            timezone: chrono_tz::Asia::Jerusalem,
            cache_ttl_seconds: 60,
            transaction_max_attempts: 8,
            transaction_backoff_ms: 5,
            event_catalog_path: "./events.yaml".to_string(),
            max_body_bytes: 1024,
            request_timeout_seconds: 5,
        }
    }

    #[test]
    fn open_when_no_token_configured() {
        assert!(authorize(&config(None), &HeaderMap::new()));
    }

    #[test]
    fn bearer_token_must_match() {
        let config = config(Some("s3cret"));
        let mut headers = HeaderMap::new();
        assert!(!authorize(&config, &headers));

        headers.insert("Authorization", HeaderValue::from_static("Bearer nope"));
        assert!(!authorize(&config, &headers));

        headers.insert("Authorization", HeaderValue::from_static("Bearer s3cret"));
        assert!(authorize(&config, &headers));
    }
}

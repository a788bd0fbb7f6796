use backend_domain::{EntitlementKey, EventKey, ParticipantId};

use crate::{AppError, AppState};

const MAX_PARTICIPANT_ID_LEN: usize = 128;
const MAX_EVENT_KEY_LEN: usize = 32;

pub fn normalize_participant_id(raw: &str) -> Result<ParticipantId, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("participant_id must not be empty".to_string()));
    }
    if trimmed.len() > MAX_PARTICIPANT_ID_LEN {
        return Err(AppError::BadRequest("participant_id is too long".to_string()));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(AppError::BadRequest(
            "participant_id contains control characters".to_string(),
        ));
    }
    Ok(ParticipantId(trimmed.to_string()))
}

pub fn normalize_event_key(raw: &str) -> Result<EventKey, AppError> {
    let key = raw.trim().to_uppercase();
    if key.is_empty() {
        return Err(AppError::BadRequest("event_key must not be empty".to_string()));
    }
    if key.len() > MAX_EVENT_KEY_LEN {
        return Err(AppError::BadRequest("event_key is too long".to_string()));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(AppError::BadRequest(
            "event_key contains invalid characters".to_string(),
        ));
    }
    Ok(EventKey(key))
}

/// Normalizes the key and, when a catalog is loaded, requires it to be listed.
pub async fn resolve_event_key(state: &AppState, raw: &str) -> Result<EventKey, AppError> {
    let key = normalize_event_key(raw)?;
    let catalog = state.event_catalog.read().await;
    if !catalog.is_empty() && !catalog.iter().any(|entry| entry.event_key == key) {
        return Err(AppError::BadRequest(format!("unknown event '{}'", key)));
    }
    Ok(key)
}

pub async fn resolve_entitlement_key(
    state: &AppState,
    participant_id: &str,
    event_key: &str,
) -> Result<EntitlementKey, AppError> {
    let participant_id = normalize_participant_id(participant_id)?;
    let event_key = resolve_event_key(state, event_key).await?;
    Ok(EntitlementKey::new(
        state.period().to_string(),
        participant_id,
        event_key,
    ))
}

/// Explicit admin edits are strict: a non-negative integer or nothing.
pub fn parse_admin_quantity(value: &serde_json::Value) -> Result<u32, AppError> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "quantity must be a non-negative integer, got {}",
                value
            ))
        })
}

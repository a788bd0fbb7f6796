use backend_domain::{EntitlementRecord, EntitlementStatus, EventScope};

use crate::dtos::RedeemedEntry;
use crate::validation::{normalize_participant_id, resolve_entitlement_key, resolve_event_key};
use crate::{AppError, AppState};

pub async fn get_status(
    state: &AppState,
    participant_id: &str,
    event_key: &str,
) -> Result<EntitlementStatus, AppError> {
    let key = resolve_entitlement_key(state, participant_id, event_key).await?;
    let current = state.entitlements.get(&key).await?;
    current.map(|doc| doc.value.status()).ok_or_else(|| {
        AppError::NotFound(format!(
            "participant '{}' is not eligible for {}",
            key.participant_id, key.event_key
        ))
    })
}

/// Every entitlement of one participant in the current period, by event key.
pub async fn list_for_participant(
    state: &AppState,
    participant_id: &str,
) -> Result<Vec<EntitlementStatus>, AppError> {
    let participant_id = normalize_participant_id(participant_id)?;
    let mut records = state
        .entitlements
        .list_for_participant(state.period(), &participant_id)
        .await?;
    records.sort_by(|a, b| a.event_key.cmp(&b.event_key));
    Ok(records.iter().map(|record| record.status()).collect())
}

/// Fully redeemed vouchers of one event, oldest redemption first.
pub async fn list_redeemed_for_event(
    state: &AppState,
    event_key: &str,
    force: bool,
) -> Result<Vec<RedeemedEntry>, AppError> {
    let event_key = resolve_event_key(state, event_key).await?;
    let scope = EventScope::new(state.period(), event_key);
    let records = redeemed_records(state, &scope, force).await?;
    Ok(records.iter().map(RedeemedEntry::from).collect())
}

pub(crate) async fn redeemed_records(
    state: &AppState,
    scope: &EventScope,
    force: bool,
) -> Result<Vec<EntitlementRecord>, AppError> {
    if !force {
        if let Some(records) = state.cache.redeemed(scope).await {
            return Ok(records);
        }
    }

    let generation = state.cache.generation(scope).await;
    let mut records: Vec<_> = state
        .entitlements
        .list_for_event(&scope.period, &scope.event_key)
        .await?
        .into_iter()
        .filter(|record| record.redeemed)
        .collect();
    records.sort_by(|a, b| {
        a.redeemed_at
            .cmp(&b.redeemed_at)
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    });
    state.cache.put_redeemed(scope, records.clone(), generation).await;
    Ok(records)
}

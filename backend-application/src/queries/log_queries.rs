use backend_domain::{EventScope, RedemptionLogEntry};

use crate::validation::resolve_event_key;
use crate::{AppError, AppState};

/// Newest first.
pub async fn list_redemption_log(
    state: &AppState,
    event_key: &str,
    force: bool,
) -> Result<Vec<RedemptionLogEntry>, AppError> {
    let event_key = resolve_event_key(state, event_key).await?;
    let scope = EventScope::new(state.period(), event_key);
    if !force {
        if let Some(entries) = state.cache.log(&scope).await {
            return Ok(entries);
        }
    }
    let generation = state.cache.generation(&scope).await;
    let mut entries = state.redemption_log.list_for_event(&scope).await?;
    entries.sort_by(|a, b| b.at.cmp(&a.at).then_with(|| a.participant_id.cmp(&b.participant_id)));
    state.cache.put_log(&scope, entries.clone(), generation).await;
    Ok(entries)
}

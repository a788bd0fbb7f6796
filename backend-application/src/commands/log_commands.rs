use backend_domain::EventScope;
use tracing::info;

use crate::dtos::DeletedCount;
use crate::validation::resolve_entitlement_key;
use crate::{AppError, AppState};

/// Deletes every log row of one participant for one event. Clearing an
/// already empty log is not an error.
pub async fn clear_redemption_log(
    state: &AppState,
    event_key: &str,
    participant_id: &str,
) -> Result<DeletedCount, AppError> {
    let key = resolve_entitlement_key(state, participant_id, event_key).await?;
    let scope: EventScope = key.scope();
    let deleted = state
        .redemption_log
        .delete_for_participant_event(&scope, &key.participant_id)
        .await?;
    state.cache.invalidate_event(&scope).await;
    info!(key = %key, deleted, "redemption log cleared");
    Ok(DeletedCount { deleted })
}

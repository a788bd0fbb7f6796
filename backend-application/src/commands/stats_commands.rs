use backend_domain::{AggregateStats, EventScope};
use tracing::info;

use crate::validation::resolve_event_key;
use crate::{AppError, AppState};

/// Recomputes the counters from the entitlement documents and overwrites
/// whatever drift the incremental updates left behind. Safe to run while
/// redemptions are in flight.
pub async fn rebuild_event_stats(state: &AppState, event_key: &str) -> Result<AggregateStats, AppError> {
    let event_key = resolve_event_key(state, event_key).await?;
    let scope = EventScope::new(state.period(), event_key);
    let rebuild = state.stats.rebuild(&scope, state.now()).await?;
    state.cache.invalidate_event(&scope).await;
    info!(
        event = %scope.event_key,
        records = rebuild.records,
        eligible = rebuild.stats.total_eligible_adults,
        consumed = rebuild.stats.total_consumed_adults,
        drifted = rebuild
            .previous
            .as_ref()
            .is_some_and(|previous| !previous.same_totals(&rebuild.stats)),
        "event stats rebuilt"
    );
    Ok(rebuild.stats)
}

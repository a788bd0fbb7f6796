use backend_domain::{AggregateStats, EventScope, RedeemedTotals};

use crate::dtos::EventStatsOverview;
use crate::queries::{catalog_queries, entitlement_queries};
use crate::validation::resolve_event_key;
use crate::{AppError, AppState};

/// Cached counters; an event nobody was seeded for reads as all zeros.
pub async fn get_event_stats(
    state: &AppState,
    event_key: &str,
    force: bool,
) -> Result<AggregateStats, AppError> {
    let event_key = resolve_event_key(state, event_key).await?;
    let scope = EventScope::new(state.period(), event_key);
    scope_stats(state, &scope, force).await
}

/// Counters of every catalog event in catalog order, each with the number
/// of fully redeemed vouchers.
pub async fn list_event_stats(state: &AppState, force: bool) -> Result<Vec<EventStatsOverview>, AppError> {
    let catalog = catalog_queries::list_event_catalog(state).await;
    let mut overview = Vec::with_capacity(catalog.len());
    for entry in catalog {
        let scope = EventScope::new(state.period(), entry.event_key.clone());
        let stats = scope_stats(state, &scope, force).await?;
        let redeemed = entitlement_queries::redeemed_records(state, &scope, force).await?;
        overview.push(EventStatsOverview {
            event_key: entry.event_key,
            display_name: entry.display_name,
            stats,
            redeemed: RedeemedTotals::from_records(&redeemed),
        });
    }
    Ok(overview)
}

async fn scope_stats(state: &AppState, scope: &EventScope, force: bool) -> Result<AggregateStats, AppError> {
    if !force {
        if let Some(stats) = state.cache.stats(scope).await {
            return Ok(stats);
        }
    }
    let generation = state.cache.generation(scope).await;
    let stats = match state.stats.get(scope).await? {
        Some(stats) => stats,
        None => AggregateStats::zeroed(scope.period.clone(), scope.event_key.clone(), state.now()),
    };
    state.cache.put_stats(scope, stats.clone(), generation).await;
    Ok(stats)
}

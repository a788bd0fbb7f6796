use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::{log_commands, stats_commands};
use backend_application::dtos::{DeletedCount, EventStatsOverview, ForceQuery, RedeemedEntry};
use backend_application::queries::{entitlement_queries, log_queries, stats_queries};
use backend_application::AppState;
use backend_domain::{AggregateStats, RedemptionLogEntry};

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn get_event_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_key): Path<String>,
    Query(query): Query<ForceQuery>,
) -> Result<Json<AggregateStats>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let stats = stats_queries::get_event_stats(&state, &event_key, query.is_forced()).await?;
    Ok(Json(stats))
}

pub async fn list_event_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ForceQuery>,
) -> Result<Json<Vec<EventStatsOverview>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let overview = stats_queries::list_event_stats(&state, query.is_forced()).await?;
    Ok(Json(overview))
}

pub async fn rebuild_event_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_key): Path<String>,
) -> Result<Json<AggregateStats>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let stats = stats_commands::rebuild_event_stats(&state, &event_key).await?;
    Ok(Json(stats))
}

pub async fn list_redemption_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_key): Path<String>,
    Query(query): Query<ForceQuery>,
) -> Result<Json<Vec<RedemptionLogEntry>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let entries = log_queries::list_redemption_log(&state, &event_key, query.is_forced()).await?;
    Ok(Json(entries))
}

pub async fn clear_redemption_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((event_key, participant_id)): Path<(String, String)>,
) -> Result<Json<DeletedCount>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let deleted = log_commands::clear_redemption_log(&state, &event_key, &participant_id).await?;
    Ok(Json(deleted))
}

pub async fn list_redeemed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_key): Path<String>,
    Query(query): Query<ForceQuery>,
) -> Result<Json<Vec<RedeemedEntry>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let entries = entitlement_queries::list_redeemed_for_event(&state, &event_key, query.is_forced()).await?;
    Ok(Json(entries))
}

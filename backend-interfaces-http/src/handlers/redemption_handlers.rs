use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::redemption_commands;
use backend_application::dtos::{
    EntitlementChange,
    RedeemRequest,
    RedeemResponse,
    SetFinalizedRequest,
    SetRedeemedRequest,
};
use backend_application::AppState;

use crate::error::HttpError;
use crate::middleware::authorize;

/// Door-side entry: gated by the event's schedule window.
pub async fn redeem(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((participant_id, event_key)): Path<(String, String)>,
    Json(payload): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let response =
        redemption_commands::redeem_adults_gated(&state, &participant_id, &event_key, payload).await?;
    Ok(Json(response))
}

pub async fn set_redeemed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((participant_id, event_key)): Path<(String, String)>,
    Json(payload): Json<SetRedeemedRequest>,
) -> Result<Json<EntitlementChange>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let change =
        redemption_commands::set_redeemed(&state, &participant_id, &event_key, payload.redeemed).await?;
    Ok(Json(change))
}

pub async fn set_finalized(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((participant_id, event_key)): Path<(String, String)>,
    Json(payload): Json<SetFinalizedRequest>,
) -> Result<Json<EntitlementChange>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let change =
        redemption_commands::set_finalized(&state, &participant_id, &event_key, payload.finalized).await?;
    Ok(Json(change))
}

pub async fn reopen(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((participant_id, event_key)): Path<(String, String)>,
) -> Result<Json<EntitlementChange>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let change = redemption_commands::reopen_session(&state, &participant_id, &event_key).await?;
    Ok(Json(change))
}

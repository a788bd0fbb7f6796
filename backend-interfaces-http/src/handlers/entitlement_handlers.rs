use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use backend_application::commands::entitlement_commands;
use backend_application::dtos::{
    EntitlementChange,
    RemovedCount,
    SeedEntitlementRequest,
    SeedOutcome,
    SeedParticipantRequest,
    SeedParticipantResponse,
    SetQuantityRequest,
};
use backend_application::queries::entitlement_queries;
use backend_application::AppState;
use backend_domain::EntitlementStatus;

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn seed_participant(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(participant_id): Path<String>,
    Json(payload): Json<SeedParticipantRequest>,
) -> Result<Json<SeedParticipantResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let response = entitlement_commands::seed_participant_events(&state, &participant_id, payload).await?;
    Ok(Json(response))
}

/// 201 when the record was created, 200 when it already existed.
pub async fn seed_entitlement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((participant_id, event_key)): Path<(String, String)>,
    payload: Option<Json<SeedEntitlementRequest>>,
) -> Result<(StatusCode, Json<SeedOutcome>), HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let outcome = entitlement_commands::seed_if_missing(&state, &participant_id, &event_key, request).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

pub async fn get_entitlement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((participant_id, event_key)): Path<(String, String)>,
) -> Result<Json<EntitlementStatus>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let status = entitlement_queries::get_status(&state, &participant_id, &event_key).await?;
    Ok(Json(status))
}

pub async fn list_participant_entitlements(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(participant_id): Path<String>,
) -> Result<Json<Vec<EntitlementStatus>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let statuses = entitlement_queries::list_for_participant(&state, &participant_id).await?;
    Ok(Json(statuses))
}

pub async fn set_quantity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((participant_id, event_key)): Path<(String, String)>,
    Json(payload): Json<SetQuantityRequest>,
) -> Result<Json<EntitlementChange>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let change = entitlement_commands::set_quantity(&state, &participant_id, &event_key, payload).await?;
    Ok(Json(change))
}

pub async fn remove_entitlement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((participant_id, event_key)): Path<(String, String)>,
) -> Result<Json<EntitlementChange>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let change = entitlement_commands::remove_eligibility(&state, &participant_id, &event_key).await?;
    Ok(Json(change))
}

pub async fn remove_event_entitlements(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_key): Path<String>,
) -> Result<Json<RemovedCount>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let removed = entitlement_commands::remove_event_for_all(&state, &event_key).await?;
    Ok(Json(removed))
}

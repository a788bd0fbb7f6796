use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::catalog_commands;
use backend_application::dtos::EventCatalogPayload;
use backend_application::queries::catalog_queries;
use backend_application::AppState;
use backend_domain::EventCatalogEntry;

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn list_event_catalog(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<EventCatalogEntry>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(catalog_queries::list_event_catalog(&state).await))
}

pub async fn update_event_catalog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<EventCatalogPayload>,
) -> Result<Json<Vec<EventCatalogEntry>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let entries = catalog_commands::update_event_catalog(&state, payload).await?;
    Ok(Json(entries))
}

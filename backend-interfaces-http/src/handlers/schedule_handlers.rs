use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::schedule_commands;
use backend_application::dtos::AppliedSchedules;
use backend_application::queries::schedule_queries;
use backend_application::AppState;
use backend_domain::{ScheduleWindow, WindowStatus};

use crate::error::HttpError;
use crate::middleware::authorize;

/// `null` when the event has no schedule yet.
pub async fn get_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_key): Path<String>,
) -> Result<Json<Option<ScheduleWindow>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let schedule = schedule_queries::get_schedule(&state, &event_key).await?;
    Ok(Json(schedule))
}

pub async fn put_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_key): Path<String>,
    Json(payload): Json<ScheduleWindow>,
) -> Result<Json<ScheduleWindow>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let schedule = schedule_commands::set_schedule(&state, &event_key, payload).await?;
    Ok(Json(schedule))
}

pub async fn get_window_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_key): Path<String>,
) -> Result<Json<WindowStatus>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let status = schedule_queries::window_status(&state, &event_key).await?;
    Ok(Json(status))
}

pub async fn apply_default_schedules(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AppliedSchedules>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let applied = schedule_commands::apply_default_schedules(&state).await?;
    Ok(Json(applied))
}

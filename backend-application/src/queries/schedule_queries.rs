use backend_domain::schedule_gate;
use backend_domain::{EventKey, EventScope, ScheduleWindow, WindowStatus};
use chrono::{DateTime, Utc};

use crate::validation::resolve_event_key;
use crate::{AppError, AppState};

pub async fn get_schedule(state: &AppState, event_key: &str) -> Result<Option<ScheduleWindow>, AppError> {
    let event_key = resolve_event_key(state, event_key).await?;
    let scope = EventScope::new(state.period(), event_key);
    Ok(state.schedules.get_schedule(&scope).await?)
}

/// Fails closed: no schedule, or one that does not parse, means not open.
pub async fn is_within_window(
    state: &AppState,
    event_key: &EventKey,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    let scope = EventScope::new(state.period(), event_key.clone());
    let schedule = state.schedules.get_schedule(&scope).await?;
    Ok(schedule_gate::is_within_window(
        schedule.as_ref(),
        now,
        state.config.timezone,
    ))
}

pub async fn window_status(state: &AppState, event_key: &str) -> Result<WindowStatus, AppError> {
    let event_key = resolve_event_key(state, event_key).await?;
    let scope = EventScope::new(state.period(), event_key);
    let schedule = state.schedules.get_schedule(&scope).await?;
    Ok(schedule_gate::window_status(
        schedule.as_ref(),
        state.now(),
        state.config.timezone,
    ))
}

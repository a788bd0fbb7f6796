use backend_domain::{parse_clock_time, parse_date, EventScope, ScheduleWindow};
use tracing::{info, warn};

use crate::dtos::AppliedSchedules;
use crate::queries::catalog_queries;
use crate::validation::resolve_event_key;
use crate::{AppError, AppState};

pub async fn set_schedule(
    state: &AppState,
    event_key: &str,
    window: ScheduleWindow,
) -> Result<ScheduleWindow, AppError> {
    let event_key = resolve_event_key(state, event_key).await?;
    let mut window = validate_window(window)?;
    window.updated_at = Some(state.now());
    let scope = EventScope::new(state.period(), event_key);
    state.schedules.put_schedule(&scope, &window).await?;
    info!(
        event = %scope.event_key,
        date = window.date.as_deref().unwrap_or("-"),
        open = window.open_time.as_deref().unwrap_or("-"),
        close = window.close_time.as_deref().unwrap_or("-"),
        "schedule updated"
    );
    Ok(window)
}

/// Writes the catalog's default window for every event that has none yet.
/// Admin-edited windows are left alone.
pub async fn apply_default_schedules(state: &AppState) -> Result<AppliedSchedules, AppError> {
    let mut applied = Vec::new();
    for entry in catalog_queries::list_event_catalog(state).await {
        let Some(default) = entry.default_schedule else {
            continue;
        };
        let scope = EventScope::new(state.period(), entry.event_key.clone());
        if state.schedules.get_schedule(&scope).await?.is_some() {
            continue;
        }
        let mut window = match validate_window(default) {
            Ok(window) => window,
            Err(err) => {
                warn!(event = %entry.event_key, "skipping invalid default schedule: {}", err);
                continue;
            }
        };
        window.updated_at = Some(state.now());
        state.schedules.put_schedule(&scope, &window).await?;
        applied.push(entry.event_key);
    }
    info!(applied = applied.len(), "default schedules applied");
    Ok(AppliedSchedules { applied })
}

/// Unset fields are allowed (the gate stays closed); set fields must parse.
fn validate_window(window: ScheduleWindow) -> Result<ScheduleWindow, AppError> {
    let window = window.normalized();
    if let Some(date) = window.date.as_deref() {
        parse_date(date).map_err(|err| AppError::BadRequest(format!("{:#}", err)))?;
    }
    for time in [window.open_time.as_deref(), window.close_time.as_deref()]
        .into_iter()
        .flatten()
    {
        parse_clock_time(time).map_err(|err| AppError::BadRequest(format!("{:#}", err)))?;
    }
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_become_unset() {
        let mut window = ScheduleWindow::new("2025-11-17", "23:30", " ");
        window.date = Some("".to_string());
        let window = validate_window(window).expect("valid");
        assert_eq!(window.date, None);
        assert_eq!(window.close_time, None);
        assert_eq!(window.open_time.as_deref(), Some("23:30"));
    }

    #[test]
    fn malformed_time_is_rejected() {
        let window = ScheduleWindow::new("2025-11-17", "7pm", "22:00");
        match validate_window(window) {
            Err(AppError::BadRequest(_)) => {}
            other => panic!("unexpected result: {:?}", other.map(|w| w.open_time)),
        }
    }

    #[test]
    fn malformed_date_is_rejected() {
        let window = ScheduleWindow::new("17/11/2025", "19:00", "22:00");
        assert!(validate_window(window).is_err());
    }
}

use std::collections::HashSet;

use backend_domain::EventCatalogEntry;
use tracing::info;

use crate::dtos::EventCatalogPayload;
use crate::validation::normalize_event_key;
use crate::{AppError, AppState};

pub async fn update_event_catalog(
    state: &AppState,
    payload: EventCatalogPayload,
) -> Result<Vec<EventCatalogEntry>, AppError> {
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(payload.events.len());
    for entry in payload.events {
        let event_key = normalize_event_key(entry.event_key.as_str())?;
        if !seen.insert(event_key.clone()) {
            return Err(AppError::BadRequest(format!("duplicate event '{}'", event_key)));
        }
        let display_name = entry.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(AppError::BadRequest(format!(
                "display_name is required for '{}'",
                event_key
            )));
        }
        entries.push(EventCatalogEntry {
            event_key,
            display_name,
            description: backend_domain::normalize_optional_text(entry.description),
            default_schedule: entry.default_schedule.map(|window| window.normalized()),
        });
    }

    state
        .config_repo
        .save_event_catalog(&state.config.event_catalog_path, &entries)
        .await?;
    *state.event_catalog.write().await = entries.clone();
    info!(events = entries.len(), "event catalog updated");
    Ok(entries)
}

use backend_domain::{EventCatalogEntry, EventKey};

use crate::AppState;

pub async fn list_event_catalog(state: &AppState) -> Vec<EventCatalogEntry> {
    state.event_catalog.read().await.clone()
}

pub async fn find_event(state: &AppState, event_key: &EventKey) -> Option<EventCatalogEntry> {
    state
        .event_catalog
        .read()
        .await
        .iter()
        .find(|entry| &entry.event_key == event_key)
        .cloned()
}

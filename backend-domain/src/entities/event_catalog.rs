// Event catalog entity

use serde::{Deserialize, Serialize};

use crate::entities::ScheduleWindow;
use crate::value_objects::EventKey;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCatalogEntry {
    pub event_key: EventKey,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schedule: Option<ScheduleWindow>,
}

/// One event to seed for a participant; `quantity` overrides the participant's adults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSeed {
    pub event_key: EventKey,
    #[serde(default)]
    pub quantity: Option<u32>,
}

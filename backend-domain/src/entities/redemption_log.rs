// Redemption log entity
// Historical fact: one row per redemption action, never rewritten

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::{EventKey, ParticipantId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionLogEntry {
    pub id: Uuid,
    pub period: String,
    pub participant_id: ParticipantId,
    pub event_key: EventKey,
    pub count: u32,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub quantity: u32,
    pub redeemed_after: bool,
}

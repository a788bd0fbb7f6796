// Request and response payloads shared by the commands, queries and HTTP layer.

use backend_domain::{
    AggregateStats,
    EntitlementRecord,
    EntitlementStatus,
    EventCatalogEntry,
    EventKey,
    EventSeed,
    ParticipantId,
    RedeemedTotals,
    StatsDelta,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedEntitlementRequest {
    #[serde(default)]
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParticipantPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hotel: Option<String>,
    #[serde(default)]
    pub reservation_num: Option<String>,
    #[serde(default)]
    pub adults: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedParticipantRequest {
    #[serde(default)]
    pub participant: ParticipantPayload,
    /// Empty means every event in the catalog.
    #[serde(default)]
    pub events: Vec<EventSeed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedOutcome {
    pub created: bool,
    pub status: EntitlementStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedParticipantResponse {
    pub participant_id: Option<ParticipantId>,
    pub created: Vec<EventKey>,
    pub existing: Vec<EventKey>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedeemRequest {
    /// Head count as sent by the client; anything non-numeric counts as zero.
    #[serde(default)]
    pub count: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedeemResponse {
    pub applied_count: u32,
    pub now_fully_redeemed: bool,
    pub status: EntitlementStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetRedeemedRequest {
    pub redeemed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetFinalizedRequest {
    pub finalized: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetQuantityRequest {
    #[serde(default)]
    pub quantity: serde_json::Value,
}

/// Result of an admin write: the new state and the stats delta it produced.
#[derive(Debug, Clone, Serialize)]
pub struct EntitlementChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntitlementStatus>,
    pub delta: StatsDelta,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovedCount {
    pub removed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedCount {
    pub deleted: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForceQuery {
    #[serde(default)]
    pub force: Option<bool>,
}

impl ForceQuery {
    pub fn is_forced(&self) -> bool {
        self.force.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedeemedEntry {
    pub participant_id: ParticipantId,
    pub event_key: EventKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_num: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adults: Option<u32>,
    pub quantity: u32,
    pub consumed: u32,
    pub finalized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl From<&EntitlementRecord> for RedeemedEntry {
    fn from(record: &EntitlementRecord) -> Self {
        Self {
            participant_id: record.participant_id.clone(),
            event_key: record.event_key.clone(),
            event_name: record.event_name.clone(),
            participant_name: record.participant_name.clone(),
            reservation_num: record.reservation_num.clone(),
            hotel: record.hotel.clone(),
            adults: record.adults,
            quantity: record.quantity,
            consumed: record.effective_consumed(),
            finalized: record.finalized,
            redeemed_at: record.redeemed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedSchedules {
    pub applied: Vec<EventKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventCatalogPayload {
    pub events: Vec<EventCatalogEntry>,
}

/// One row of the all-events dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct EventStatsOverview {
    pub event_key: EventKey,
    pub display_name: String,
    pub stats: AggregateStats,
    /// Counted from the entitlement records, not the incremental counters.
    #[serde(flatten)]
    pub redeemed: RedeemedTotals,
}

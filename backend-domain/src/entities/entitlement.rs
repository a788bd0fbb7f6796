// Entitlement entity
// One document per participant x event: how many adults may enter and how many did

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{EventCatalogEntry, ParticipantSnapshot};
use crate::value_objects::{EntitlementKey, EventKey, ParticipantId};

/// Quantity assumed for legacy documents written before `quantity` existed.
pub const LEGACY_DEFAULT_QUANTITY: u32 = 1;

fn legacy_default_quantity() -> u32 {
    LEGACY_DEFAULT_QUANTITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    pub period: String,
    pub participant_id: ParticipantId,
    pub event_key: EventKey,
    #[serde(default = "legacy_default_quantity")]
    pub quantity: u32,
    /// Missing only on legacy documents; see [`EntitlementRecord::effective_consumed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed: Option<u32>,
    #[serde(default)]
    pub redeemed: bool,
    #[serde(default)]
    pub finalized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_num: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adults: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntitlementRecord {
    /// Fresh record: nothing consumed, nothing redeemed.
    pub fn seeded(key: &EntitlementKey, quantity: u32, now: DateTime<Utc>) -> Self {
        Self {
            period: key.period.clone(),
            participant_id: key.participant_id.clone(),
            event_key: key.event_key.clone(),
            quantity,
            consumed: Some(0),
            redeemed: false,
            finalized: false,
            redeemed_at: None,
            finalized_at: None,
            event_name: None,
            description: None,
            participant_name: None,
            hotel: None,
            reservation_num: None,
            adults: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn key(&self) -> EntitlementKey {
        EntitlementKey::new(
            self.period.clone(),
            self.participant_id.clone(),
            self.event_key.clone(),
        )
    }

    /// Consumed adults, honouring legacy documents that only carry the
    /// boolean flag. Always within `0..=quantity`.
    pub fn effective_consumed(&self) -> u32 {
        let raw = match self.consumed {
            Some(consumed) => consumed,
            None if self.redeemed => self.quantity,
            None => 0,
        };
        raw.min(self.quantity)
    }

    pub fn remaining(&self) -> u32 {
        self.quantity - self.effective_consumed()
    }

    pub fn status(&self) -> EntitlementStatus {
        let consumed = self.effective_consumed();
        EntitlementStatus {
            participant_id: self.participant_id.clone(),
            event_key: self.event_key.clone(),
            quantity: self.quantity,
            consumed,
            remaining: self.quantity - consumed,
            redeemed: is_fully_redeemed(self.quantity, consumed),
            finalized: self.finalized,
            redeemed_at: self.redeemed_at,
            finalized_at: self.finalized_at,
        }
    }

    /// Fills event metadata that is still missing. Returns true when anything changed.
    pub fn fill_event_metadata(&mut self, entry: &EventCatalogEntry) -> bool {
        let mut changed = false;
        if self.event_name.is_none() && !entry.display_name.trim().is_empty() {
            self.event_name = Some(entry.display_name.clone());
            changed = true;
        }
        if self.description.is_none() {
            if let Some(description) = entry.description.as_ref().filter(|d| !d.trim().is_empty()) {
                self.description = Some(description.clone());
                changed = true;
            }
        }
        changed
    }

    /// Overwrites the denormalized participant fields with a fresh snapshot.
    pub fn apply_participant_snapshot(&mut self, snapshot: &ParticipantSnapshot) {
        if snapshot.name.is_some() {
            self.participant_name = snapshot.name.clone();
        }
        if snapshot.hotel.is_some() {
            self.hotel = snapshot.hotel.clone();
        }
        if snapshot.reservation_num.is_some() {
            self.reservation_num = snapshot.reservation_num.clone();
        }
        if snapshot.adults.is_some() {
            self.adults = snapshot.adults;
        }
    }

    /// Fills participant fields that are still missing. Returns true when anything changed.
    pub fn fill_participant_snapshot(&mut self, snapshot: &ParticipantSnapshot) -> bool {
        let mut changed = false;
        if self.participant_name.is_none() && snapshot.name.is_some() {
            self.participant_name = snapshot.name.clone();
            changed = true;
        }
        if self.hotel.is_none() && snapshot.hotel.is_some() {
            self.hotel = snapshot.hotel.clone();
            changed = true;
        }
        if self.reservation_num.is_none() && snapshot.reservation_num.is_some() {
            self.reservation_num = snapshot.reservation_num.clone();
            changed = true;
        }
        if self.adults.is_none() && snapshot.adults.is_some() {
            self.adults = snapshot.adults;
            changed = true;
        }
        changed
    }
}

/// `redeemed` is derived: every entitled adult has entered and there was at least one.
pub fn is_fully_redeemed(quantity: u32, consumed: u32) -> bool {
    quantity > 0 && consumed >= quantity
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitlementStatus {
    pub participant_id: ParticipantId,
    pub event_key: EventKey,
    pub quantity: u32,
    pub consumed: u32,
    pub remaining: u32,
    pub redeemed: bool,
    pub finalized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
}

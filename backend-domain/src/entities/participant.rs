// Participant entity
// Directory entry imported from the reservation list

use serde::{Deserialize, Serialize};

use crate::value_objects::ParticipantId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub participant_id: ParticipantId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hotel: Option<String>,
    #[serde(default)]
    pub reservation_num: Option<String>,
    /// Default entitlement quantity for every event.
    #[serde(default)]
    pub adults: Option<u32>,
}

impl Participant {
    pub fn snapshot(&self) -> ParticipantSnapshot {
        ParticipantSnapshot {
            name: self.name.clone(),
            hotel: self.hotel.clone(),
            reservation_num: self.reservation_num.clone(),
            adults: self.adults,
        }
    }
}

/// Denormalized copy stored on entitlement records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSnapshot {
    pub name: Option<String>,
    pub hotel: Option<String>,
    pub reservation_num: Option<String>,
    pub adults: Option<u32>,
}

// Identifier value objects

use std::fmt;

use serde::{Deserialize, Serialize};

/// Externally assigned participant identifier (reservation system id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Event code from the festival catalog, always upper case (`OPENING`, `RB1`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(pub String);

impl EventKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One event within one scheduling period. Keys stats, schedules and log rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventScope {
    pub period: String,
    pub event_key: EventKey,
}

impl EventScope {
    pub fn new(period: impl Into<String>, event_key: EventKey) -> Self {
        Self {
            period: period.into(),
            event_key,
        }
    }
}

/// Address of a single entitlement document (participant x event x period).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntitlementKey {
    pub period: String,
    pub participant_id: ParticipantId,
    pub event_key: EventKey,
}

impl EntitlementKey {
    pub fn new(period: impl Into<String>, participant_id: ParticipantId, event_key: EventKey) -> Self {
        Self {
            period: period.into(),
            participant_id,
            event_key,
        }
    }

    pub fn scope(&self) -> EventScope {
        EventScope::new(self.period.clone(), self.event_key.clone())
    }
}

impl fmt::Display for EntitlementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.period, self.participant_id, self.event_key)
    }
}

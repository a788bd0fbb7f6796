// Aggregate stats delta value object

use serde::{Deserialize, Serialize};

/// Signed change to the three per-event counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDelta {
    #[serde(default)]
    pub eligible: i64,
    #[serde(default)]
    pub consumed: i64,
    #[serde(default)]
    pub participants: i64,
}

impl StatsDelta {
    pub fn consumed(consumed: i64) -> Self {
        Self {
            consumed,
            ..Self::default()
        }
    }

    /// Delta for a freshly seeded record.
    pub fn seeded(quantity: u32) -> Self {
        Self {
            eligible: i64::from(quantity),
            consumed: 0,
            participants: 1,
        }
    }

    /// Delta for a record that is physically removed.
    pub fn removed(quantity: u32, consumed: u32) -> Self {
        Self {
            eligible: -i64::from(quantity),
            consumed: -i64::from(consumed),
            participants: -1,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.eligible == 0 && self.consumed == 0 && self.participants == 0
    }
}

impl std::ops::Add for StatsDelta {
    type Output = StatsDelta;

    fn add(self, rhs: StatsDelta) -> StatsDelta {
        StatsDelta {
            eligible: self.eligible + rhs.eligible,
            consumed: self.consumed + rhs.consumed,
            participants: self.participants + rhs.participants,
        }
    }
}

// Aggregate stats entity
// Denormalized per-event counters for fast dashboard reads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::EntitlementRecord;
use crate::value_objects::{EventKey, StatsDelta};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub period: String,
    pub event_key: EventKey,
    pub total_eligible_adults: i64,
    pub total_consumed_adults: i64,
    pub participants: i64,
    pub updated_at: DateTime<Utc>,
}

impl AggregateStats {
    pub fn zeroed(period: impl Into<String>, event_key: EventKey, now: DateTime<Utc>) -> Self {
        Self {
            period: period.into(),
            event_key,
            total_eligible_adults: 0,
            total_consumed_adults: 0,
            participants: 0,
            updated_at: now,
        }
    }

    /// Counters recomputed from the authoritative records of one event.
    pub fn from_records<'a>(
        period: impl Into<String>,
        event_key: EventKey,
        records: impl IntoIterator<Item = &'a EntitlementRecord>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut stats = Self::zeroed(period, event_key, now);
        for record in records {
            let delta = StatsDelta::seeded(record.quantity)
                + StatsDelta::consumed(i64::from(record.effective_consumed()));
            stats.apply(delta, now);
        }
        stats
    }

    pub fn same_totals(&self, other: &AggregateStats) -> bool {
        self.total_eligible_adults == other.total_eligible_adults
            && self.total_consumed_adults == other.total_consumed_adults
            && self.participants == other.participants
    }

    /// Adds each counter independently.
    pub fn apply(&mut self, delta: StatsDelta, now: DateTime<Utc>) {
        self.total_eligible_adults += delta.eligible;
        self.total_consumed_adults += delta.consumed;
        self.participants += delta.participants;
        self.updated_at = now;
    }
}

/// Vouchers of one event that are fully used, counted from the records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemedTotals {
    pub redeemed_participants: u64,
    pub redeemed_adults: u64,
}

impl RedeemedTotals {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a EntitlementRecord>) -> Self {
        records
            .into_iter()
            .filter(|record| record.redeemed)
            .fold(Self::default(), |mut totals, record| {
                totals.redeemed_participants += 1;
                totals.redeemed_adults += u64::from(record.quantity);
                totals
            })
    }
}

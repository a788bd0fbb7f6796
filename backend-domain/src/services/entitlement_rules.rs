// Entitlement mutation rules
// Every write to an entitlement goes through one of these functions inside a
// store transaction. They take the current document and return the next one
// plus the stats delta the write implies.

use chrono::{DateTime, Utc};

use crate::entities::{is_fully_redeemed, EntitlementRecord};
use crate::value_objects::StatsDelta;

#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub record: EntitlementRecord,
    pub delta: StatsDelta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedeemMutation {
    pub record: EntitlementRecord,
    pub delta: StatsDelta,
    /// Adults actually marked as entered by this call.
    pub applied: u32,
    pub now_fully_redeemed: bool,
}

/// Floors a requested head count to a non-negative integer. Anything that is
/// not a finite number counts as zero.
pub fn requested_count(value: &serde_json::Value) -> u32 {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).unwrap_or(u32::MAX);
    }
    if value.as_i64().is_some() {
        return 0;
    }
    match value.as_f64() {
        Some(n) if n.is_finite() && n >= 1.0 => {
            let floored = n.floor();
            if floored >= f64::from(u32::MAX) {
                u32::MAX
            } else {
                floored as u32
            }
        }
        _ => 0,
    }
}

/// Adds `count` adults, saturating at the entitled quantity.
pub fn redeem_adults(current: &EntitlementRecord, count: u32, now: DateTime<Utc>) -> RedeemMutation {
    let before = current.effective_consumed();
    let next = before.saturating_add(count).min(current.quantity);
    let record = with_consumed(current, next, now);
    let applied = next - before;
    RedeemMutation {
        now_fully_redeemed: record.redeemed,
        record,
        delta: StatsDelta::consumed(i64::from(applied)),
        applied,
    }
}

/// Forces the record to fully redeemed (`consumed = quantity`) or fully open (`consumed = 0`).
pub fn set_redeemed(current: &EntitlementRecord, redeemed: bool, now: DateTime<Utc>) -> Mutation {
    let before = current.effective_consumed();
    let next = if redeemed { current.quantity } else { 0 };
    Mutation {
        record: with_consumed(current, next, now),
        delta: StatsDelta::consumed(i64::from(next) - i64::from(before)),
    }
}

/// Admin quantity edit: re-clamps `consumed` and reports both deltas.
pub fn set_quantity(current: &EntitlementRecord, quantity: u32, now: DateTime<Utc>) -> Mutation {
    let before_quantity = current.quantity;
    let before_consumed = current.effective_consumed();
    let mut resized = current.clone();
    resized.quantity = quantity;
    resized.consumed = Some(before_consumed);
    let next = before_consumed.min(quantity);
    Mutation {
        record: with_consumed(&resized, next, now),
        delta: StatsDelta {
            eligible: i64::from(quantity) - i64::from(before_quantity),
            consumed: i64::from(next) - i64::from(before_consumed),
            participants: 0,
        },
    }
}

/// Flag flip with timestamp bookkeeping; quantity math is untouched.
pub fn set_finalized(current: &EntitlementRecord, finalized: bool, now: DateTime<Utc>) -> Mutation {
    let mut record = current.clone();
    record.finalized = finalized;
    record.finalized_at = if finalized {
        current.finalized_at.or(Some(now))
    } else {
        None
    };
    record.updated_at = Some(now);
    Mutation {
        record,
        delta: StatsDelta::default(),
    }
}

/// Starts a new entry session: clears the finalize lock and resets consumption.
pub fn reopen_session(current: &EntitlementRecord, now: DateTime<Utc>) -> Mutation {
    let reset = set_redeemed(current, false, now);
    let unlocked = set_finalized(&reset.record, false, now);
    Mutation {
        record: unlocked.record,
        delta: reset.delta,
    }
}

fn with_consumed(current: &EntitlementRecord, consumed: u32, now: DateTime<Utc>) -> EntitlementRecord {
    let mut record = current.clone();
    let redeemed = is_fully_redeemed(record.quantity, consumed);
    record.consumed = Some(consumed);
    record.redeemed = redeemed;
    record.redeemed_at = if redeemed {
        current.redeemed_at.or(Some(now))
    } else {
        None
    };
    record.updated_at = Some(now);
    record
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::value_objects::{EntitlementKey, EventKey, ParticipantId};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 19, hour, 0, 0).unwrap()
    }

    fn record(quantity: u32) -> EntitlementRecord {
        let key = EntitlementKey::new(
            "2025",
            ParticipantId("355".to_string()),
            EventKey("COCKTAIL".to_string()),
        );
        EntitlementRecord::seeded(&key, quantity, at(10))
    }

    #[test]
    fn partial_then_clamped_redemption() {
        let first = redeem_adults(&record(3), 2, at(17));
        assert_eq!(first.record.consumed, Some(2));
        assert!(!first.record.redeemed);
        assert_eq!(first.applied, 2);
        assert_eq!(first.record.redeemed_at, None);

        let second = redeem_adults(&first.record, 5, at(18));
        assert_eq!(second.record.consumed, Some(3));
        assert!(second.record.redeemed);
        assert!(second.now_fully_redeemed);
        assert_eq!(second.applied, 1);
        assert_eq!(second.delta, StatsDelta::consumed(1));
        assert_eq!(second.record.redeemed_at, Some(at(18)));
    }

    #[test]
    fn saturated_record_keeps_first_redeemed_at() {
        let full = redeem_adults(&record(2), 2, at(17));
        let again = redeem_adults(&full.record, 1, at(19));
        assert_eq!(again.applied, 0);
        assert!(again.delta.is_zero());
        assert_eq!(again.record.redeemed_at, Some(at(17)));
    }

    #[test]
    fn chunking_does_not_change_saturation() {
        for chunks in [vec![1, 1, 1, 1], vec![4], vec![2, 0, 9], vec![3, 1]] {
            let mut current = record(3);
            for chunk in chunks {
                current = redeem_adults(&current, chunk, at(18)).record;
            }
            assert_eq!(current.consumed, Some(3));
            assert!(current.redeemed);
        }
    }

    #[test]
    fn legacy_redeemed_flag_counts_as_fully_consumed() {
        let mut legacy = record(2);
        legacy.consumed = None;
        legacy.redeemed = true;
        let outcome = redeem_adults(&legacy, 1, at(18));
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.record.consumed, Some(2));
    }

    #[test]
    fn requested_count_floors_and_rejects_garbage() {
        assert_eq!(requested_count(&json!(2)), 2);
        assert_eq!(requested_count(&json!(2.9)), 2);
        assert_eq!(requested_count(&json!(-3)), 0);
        assert_eq!(requested_count(&json!(-0.5)), 0);
        assert_eq!(requested_count(&json!(0.7)), 0);
        assert_eq!(requested_count(&json!("2")), 0);
        assert_eq!(requested_count(&json!(null)), 0);
    }

    #[test]
    fn set_redeemed_round_trip_returns_to_zero() {
        let on = set_redeemed(&record(4), true, at(18));
        assert_eq!(on.record.consumed, Some(4));
        assert!(on.record.redeemed);
        assert_eq!(on.delta, StatsDelta::consumed(4));

        let off = set_redeemed(&on.record, false, at(19));
        assert_eq!(off.record.consumed, Some(0));
        assert!(!off.record.redeemed);
        assert_eq!(off.record.redeemed_at, None);
        assert_eq!(off.delta, StatsDelta::consumed(-4));
    }

    #[test]
    fn shrinking_quantity_clamps_consumed() {
        let full = set_redeemed(&record(3), true, at(18)).record;
        let shrunk = set_quantity(&full, 1, at(19));
        assert_eq!(shrunk.record.quantity, 1);
        assert_eq!(shrunk.record.consumed, Some(1));
        assert!(shrunk.record.redeemed);
        assert_eq!(shrunk.record.redeemed_at, Some(at(18)));
        assert_eq!(
            shrunk.delta,
            StatsDelta {
                eligible: -2,
                consumed: -2,
                participants: 0
            }
        );
    }

    #[test]
    fn growing_quantity_reopens_redemption() {
        let full = set_redeemed(&record(2), true, at(18)).record;
        let grown = set_quantity(&full, 5, at(19));
        assert_eq!(grown.record.consumed, Some(2));
        assert!(!grown.record.redeemed);
        assert_eq!(grown.record.redeemed_at, None);
        assert_eq!(grown.delta.eligible, 3);
        assert_eq!(grown.delta.consumed, 0);
    }

    #[test]
    fn finalize_is_independent_of_consumption() {
        let partial = redeem_adults(&record(3), 1, at(18)).record;
        let locked = set_finalized(&partial, true, at(19));
        assert!(locked.record.finalized);
        assert_eq!(locked.record.finalized_at, Some(at(19)));
        assert_eq!(locked.record.consumed, Some(1));
        assert!(locked.delta.is_zero());

        let relocked = set_finalized(&locked.record, true, at(20));
        assert_eq!(relocked.record.finalized_at, Some(at(19)));

        let unlocked = set_finalized(&relocked.record, false, at(21));
        assert!(!unlocked.record.finalized);
        assert_eq!(unlocked.record.finalized_at, None);
    }

    #[test]
    fn reopen_session_resets_consumption_and_lock() {
        let full = set_redeemed(&record(2), true, at(18)).record;
        let locked = set_finalized(&full, true, at(19)).record;
        let reopened = reopen_session(&locked, at(20));
        assert!(!reopened.record.finalized);
        assert_eq!(reopened.record.consumed, Some(0));
        assert!(!reopened.record.redeemed);
        assert_eq!(reopened.delta, StatsDelta::consumed(-2));
    }
}

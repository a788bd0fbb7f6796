use backend_domain::entitlement_rules;
use backend_domain::EntitlementKey;
use tracing::info;

use crate::commands::entitlement_commands::{lookup_participant, publish, require_record};
use crate::dtos::{EntitlementChange, RedeemRequest, RedeemResponse};
use crate::queries::schedule_queries;
use crate::transaction::{run_transaction, TxStep};
use crate::validation::resolve_entitlement_key;
use crate::{AppError, AppState, ChangeAction};

/// Marks up to `count` more adults as entered. Never exceeds the quantity; a
/// request that changes nothing is not written and leaves no log row.
pub async fn redeem_adults(
    state: &AppState,
    participant_id: &str,
    event_key: &str,
    request: RedeemRequest,
) -> Result<RedeemResponse, AppError> {
    let key = resolve_entitlement_key(state, participant_id, event_key).await?;
    redeem(state, &key, &request, false).await
}

/// Same as [`redeem_adults`] but only inside the event's schedule window and
/// never on a finalized voucher.
pub async fn redeem_adults_gated(
    state: &AppState,
    participant_id: &str,
    event_key: &str,
    request: RedeemRequest,
) -> Result<RedeemResponse, AppError> {
    let key = resolve_entitlement_key(state, participant_id, event_key).await?;
    let now = state.now();
    if !schedule_queries::is_within_window(state, &key.event_key, now).await? {
        state.metrics.record_gate_rejection();
        info!(key = %key, "redemption rejected outside schedule window");
        return Err(AppError::ScheduleClosed(format!(
            "{} is not open for redemption",
            key.event_key
        )));
    }
    redeem(state, &key, &request, true).await
}

pub async fn set_redeemed(
    state: &AppState,
    participant_id: &str,
    event_key: &str,
    redeemed: bool,
) -> Result<EntitlementChange, AppError> {
    let key = resolve_entitlement_key(state, participant_id, event_key).await?;
    let snapshot = if redeemed {
        lookup_participant(state, &key.participant_id)
            .await
            .map(|participant| participant.snapshot())
    } else {
        None
    };
    let now = state.now();
    let outcome = run_transaction(state, &key, |current| {
        let current = require_record(&key, current)?;
        let mut mutation = entitlement_rules::set_redeemed(current, redeemed, now);
        if let Some(snapshot) = snapshot.as_ref() {
            mutation.record.apply_participant_snapshot(snapshot);
        }
        Ok(TxStep::Write(Some(mutation.record.clone()), mutation))
    })
    .await?;
    let mutation = outcome.value;

    info!(key = %key, redeemed, delta = ?mutation.delta, "redeemed flag set");
    publish(
        state,
        &key,
        outcome.committed_version,
        ChangeAction::RedeemedSet { redeemed },
        mutation.delta,
        Some(&mutation.record),
    )
    .await;
    Ok(EntitlementChange {
        status: Some(mutation.record.status()),
        delta: mutation.delta,
    })
}

pub async fn set_finalized(
    state: &AppState,
    participant_id: &str,
    event_key: &str,
    finalized: bool,
) -> Result<EntitlementChange, AppError> {
    let key = resolve_entitlement_key(state, participant_id, event_key).await?;
    let now = state.now();
    let outcome = run_transaction(state, &key, |current| {
        let current = require_record(&key, current)?;
        let mutation = entitlement_rules::set_finalized(current, finalized, now);
        Ok(TxStep::Write(Some(mutation.record.clone()), mutation))
    })
    .await?;
    let mutation = outcome.value;

    info!(key = %key, finalized, "finalized flag set");
    publish(
        state,
        &key,
        outcome.committed_version,
        ChangeAction::FinalizedSet { finalized },
        mutation.delta,
        Some(&mutation.record),
    )
    .await;
    Ok(EntitlementChange {
        status: Some(mutation.record.status()),
        delta: mutation.delta,
    })
}

/// Clears consumption and the finalized flag so the voucher can be used again.
pub async fn reopen_session(
    state: &AppState,
    participant_id: &str,
    event_key: &str,
) -> Result<EntitlementChange, AppError> {
    let key = resolve_entitlement_key(state, participant_id, event_key).await?;
    let now = state.now();
    let outcome = run_transaction(state, &key, |current| {
        let current = require_record(&key, current)?;
        let mutation = entitlement_rules::reopen_session(current, now);
        Ok(TxStep::Write(Some(mutation.record.clone()), mutation))
    })
    .await?;
    let mutation = outcome.value;

    info!(key = %key, delta = ?mutation.delta, "session reopened");
    publish(
        state,
        &key,
        outcome.committed_version,
        ChangeAction::SessionReopened,
        mutation.delta,
        Some(&mutation.record),
    )
    .await;
    Ok(EntitlementChange {
        status: Some(mutation.record.status()),
        delta: mutation.delta,
    })
}

async fn redeem(
    state: &AppState,
    key: &EntitlementKey,
    request: &RedeemRequest,
    reject_finalized: bool,
) -> Result<RedeemResponse, AppError> {
    let count = entitlement_rules::requested_count(&request.count);
    let now = state.now();
    let outcome = run_transaction(state, key, |current| {
        let current = require_record(key, current)?;
        if reject_finalized && current.finalized {
            return Err(AppError::Finalized(format!(
                "{} for participant '{}'",
                key.event_key, key.participant_id
            )));
        }
        let mutation = entitlement_rules::redeem_adults(current, count, now);
        if mutation.applied == 0 {
            let unchanged = entitlement_rules::RedeemMutation {
                record: current.clone(),
                ..mutation
            };
            return Ok(TxStep::Skip(unchanged));
        }
        Ok(TxStep::Write(Some(mutation.record.clone()), mutation))
    })
    .await?;
    let mutation = outcome.value;

    state.metrics.record_redemption(mutation.applied);
    if outcome.committed_version.is_some() {
        info!(
            key = %key,
            requested = count,
            applied = mutation.applied,
            fully_redeemed = mutation.now_fully_redeemed,
            "adults redeemed"
        );
        publish(
            state,
            key,
            outcome.committed_version,
            ChangeAction::Redeemed {
                applied: mutation.applied,
            },
            mutation.delta,
            Some(&mutation.record),
        )
        .await;
    }
    Ok(RedeemResponse {
        applied_count: mutation.applied,
        now_fully_redeemed: mutation.now_fully_redeemed,
        status: mutation.record.status(),
    })
}

use backend_domain::entitlement_rules;
use backend_domain::{
    EntitlementKey,
    EntitlementRecord,
    EventCatalogEntry,
    Participant,
    ParticipantId,
    ParticipantSnapshot,
    StatsDelta,
    LEGACY_DEFAULT_QUANTITY,
};
use tracing::{info, warn};

use crate::dtos::{
    EntitlementChange,
    RemovedCount,
    SeedEntitlementRequest,
    SeedOutcome,
    SeedParticipantRequest,
    SeedParticipantResponse,
    SetQuantityRequest,
};
use crate::queries::catalog_queries;
use crate::transaction::{run_transaction, TxStep};
use crate::validation::{
    normalize_participant_id,
    parse_admin_quantity,
    resolve_entitlement_key,
    resolve_event_key,
};
use crate::{AppError, AppState, ChangeAction, CommittedChange};

/// Creates the record only when absent; an existing record only gets its
/// missing metadata filled in, never a new quantity or consumption.
pub async fn seed_if_missing(
    state: &AppState,
    participant_id: &str,
    event_key: &str,
    request: SeedEntitlementRequest,
) -> Result<SeedOutcome, AppError> {
    let key = resolve_entitlement_key(state, participant_id, event_key).await?;
    let participant = lookup_participant(state, &key.participant_id).await;
    let entry = catalog_queries::find_event(state, &key.event_key).await;
    seed_key(state, &key, request.quantity, participant.as_ref(), entry.as_ref()).await
}

/// Upserts the participant into the directory and seeds the requested events
/// (every catalog event when none are listed).
pub async fn seed_participant_events(
    state: &AppState,
    participant_id: &str,
    request: SeedParticipantRequest,
) -> Result<SeedParticipantResponse, AppError> {
    let participant_id = normalize_participant_id(participant_id)?;
    let payload = request.participant;
    let participant = Participant {
        participant_id: participant_id.clone(),
        name: backend_domain::normalize_optional_text(payload.name),
        hotel: backend_domain::normalize_optional_text(payload.hotel),
        reservation_num: backend_domain::normalize_optional_text(payload.reservation_num),
        adults: payload.adults,
    };
    state.participants.upsert(&participant).await?;
    let participant = lookup_participant(state, &participant_id)
        .await
        .unwrap_or(participant);

    let seeds = if request.events.is_empty() {
        catalog_queries::list_event_catalog(state)
            .await
            .into_iter()
            .map(|entry| (entry.event_key, None))
            .collect::<Vec<_>>()
    } else {
        request
            .events
            .into_iter()
            .map(|seed| (seed.event_key, seed.quantity))
            .collect::<Vec<_>>()
    };

    let mut response = SeedParticipantResponse {
        participant_id: Some(participant_id.clone()),
        ..SeedParticipantResponse::default()
    };
    for (raw_key, quantity) in seeds {
        let event_key = resolve_event_key(state, raw_key.as_str()).await?;
        let key = EntitlementKey::new(
            state.period().to_string(),
            participant_id.clone(),
            event_key.clone(),
        );
        let entry = catalog_queries::find_event(state, &event_key).await;
        let outcome = seed_key(state, &key, quantity, Some(&participant), entry.as_ref()).await?;
        if outcome.created {
            response.created.push(event_key);
        } else {
            response.existing.push(event_key);
        }
    }
    info!(
        participant = %participant_id,
        created = response.created.len(),
        existing = response.existing.len(),
        "participant seeded"
    );
    Ok(response)
}

/// Admin quantity edit. Rejects anything but a non-negative integer before
/// touching the store.
pub async fn set_quantity(
    state: &AppState,
    participant_id: &str,
    event_key: &str,
    request: SetQuantityRequest,
) -> Result<EntitlementChange, AppError> {
    let quantity = parse_admin_quantity(&request.quantity)?;
    let key = resolve_entitlement_key(state, participant_id, event_key).await?;
    let now = state.now();
    let outcome = run_transaction(state, &key, |current| {
        let current = require_record(&key, current)?;
        let mutation = entitlement_rules::set_quantity(current, quantity, now);
        Ok(TxStep::Write(Some(mutation.record.clone()), mutation))
    })
    .await?;
    let mutation = outcome.value;

    info!(key = %key, quantity, delta = ?mutation.delta, "entitlement quantity set");
    publish(
        state,
        &key,
        outcome.committed_version,
        ChangeAction::QuantitySet,
        mutation.delta,
        Some(&mutation.record),
    )
    .await;
    Ok(EntitlementChange {
        status: Some(mutation.record.status()),
        delta: mutation.delta,
    })
}

/// Deletes the record and takes its contribution back out of the stats.
pub async fn remove_eligibility(
    state: &AppState,
    participant_id: &str,
    event_key: &str,
) -> Result<EntitlementChange, AppError> {
    let key = resolve_entitlement_key(state, participant_id, event_key).await?;
    let delta = remove_key(state, &key).await?;
    Ok(EntitlementChange { status: None, delta })
}

/// Removes one event from every participant of the current period.
pub async fn remove_event_for_all(state: &AppState, event_key: &str) -> Result<RemovedCount, AppError> {
    let event_key = resolve_event_key(state, event_key).await?;
    let records = state
        .entitlements
        .list_for_event(state.period(), &event_key)
        .await?;
    let mut removed = 0_u64;
    for record in records {
        match remove_key(state, &record.key()).await {
            Ok(_) => removed += 1,
            Err(AppError::NotFound(_)) => {}
            Err(err) => return Err(err),
        }
    }
    info!(event = %event_key, removed, "event removed for all participants");
    Ok(RemovedCount { removed })
}

pub(crate) async fn lookup_participant(
    state: &AppState,
    participant_id: &ParticipantId,
) -> Option<Participant> {
    match state.participants.lookup(participant_id).await {
        Ok(found) => found,
        Err(err) => {
            warn!(participant = %participant_id, "participant lookup failed: {:#}", err);
            None
        }
    }
}

pub(crate) fn require_record<'a>(
    key: &EntitlementKey,
    current: Option<&'a EntitlementRecord>,
) -> Result<&'a EntitlementRecord, AppError> {
    current.ok_or_else(|| {
        AppError::NotFound(format!(
            "participant '{}' is not eligible for {}",
            key.participant_id, key.event_key
        ))
    })
}

/// Hands a committed change to the post-commit hooks. Nothing runs when the
/// transaction skipped its write.
pub(crate) async fn publish(
    state: &AppState,
    key: &EntitlementKey,
    committed_version: Option<u64>,
    action: ChangeAction,
    delta: StatsDelta,
    record: Option<&EntitlementRecord>,
) {
    let Some(version) = committed_version else {
        return;
    };
    let change = CommittedChange {
        key: key.clone(),
        version,
        action,
        delta,
        record: record.cloned(),
        committed_at: state.now(),
    };
    state.hooks.dispatch(&change).await;
}

struct Seeded {
    created: bool,
    record: EntitlementRecord,
}

async fn seed_key(
    state: &AppState,
    key: &EntitlementKey,
    quantity: Option<u32>,
    participant: Option<&Participant>,
    entry: Option<&EventCatalogEntry>,
) -> Result<SeedOutcome, AppError> {
    let now = state.now();
    let quantity = quantity
        .or_else(|| participant.and_then(|p| p.adults))
        .unwrap_or(LEGACY_DEFAULT_QUANTITY);
    let snapshot = participant.map(Participant::snapshot);

    let outcome = run_transaction(state, key, |current| match current {
        None => {
            let mut record = EntitlementRecord::seeded(key, quantity, now);
            fill_metadata(&mut record, entry, snapshot.as_ref());
            Ok(TxStep::Write(
                Some(record.clone()),
                Seeded {
                    created: true,
                    record,
                },
            ))
        }
        Some(existing) => {
            let mut patched = existing.clone();
            if fill_metadata(&mut patched, entry, snapshot.as_ref()) {
                patched.updated_at = Some(now);
                Ok(TxStep::Write(
                    Some(patched.clone()),
                    Seeded {
                        created: false,
                        record: patched,
                    },
                ))
            } else {
                Ok(TxStep::Skip(Seeded {
                    created: false,
                    record: existing.clone(),
                }))
            }
        }
    })
    .await?;
    let seeded = outcome.value;

    if seeded.created {
        info!(key = %key, quantity = seeded.record.quantity, "entitlement seeded");
        publish(
            state,
            key,
            outcome.committed_version,
            ChangeAction::Seeded,
            StatsDelta::seeded(seeded.record.quantity),
            Some(&seeded.record),
        )
        .await;
    } else {
        publish(
            state,
            key,
            outcome.committed_version,
            ChangeAction::MetadataPatched,
            StatsDelta::default(),
            Some(&seeded.record),
        )
        .await;
    }
    Ok(SeedOutcome {
        created: seeded.created,
        status: seeded.record.status(),
    })
}

fn fill_metadata(
    record: &mut EntitlementRecord,
    entry: Option<&EventCatalogEntry>,
    snapshot: Option<&ParticipantSnapshot>,
) -> bool {
    let mut changed = false;
    if let Some(entry) = entry {
        changed |= record.fill_event_metadata(entry);
    }
    if let Some(snapshot) = snapshot {
        changed |= record.fill_participant_snapshot(snapshot);
    }
    changed
}

async fn remove_key(state: &AppState, key: &EntitlementKey) -> Result<StatsDelta, AppError> {
    let outcome = run_transaction(state, key, |current| {
        let current = require_record(key, current)?;
        let delta = StatsDelta::removed(current.quantity, current.effective_consumed());
        Ok(TxStep::Write(None, delta))
    })
    .await?;
    let delta = outcome.value;
    info!(key = %key, delta = ?delta, "entitlement removed");
    publish(state, key, outcome.committed_version, ChangeAction::Removed, delta, None).await;
    Ok(delta)
}

// Optimistic read-modify-write over a single entitlement document.

use std::time::Duration;

use backend_domain::{CommitOutcome, EntitlementKey, EntitlementRecord};
use tracing::{debug, warn};

use crate::{AppError, AppState};

/// What the mutation closure wants done with the document it was shown.
pub enum TxStep<T> {
    /// Replace the document (`None` deletes it) and return `T` on commit.
    Write(Option<EntitlementRecord>, T),
    /// Leave the document untouched.
    Skip(T),
}

/// Closure output plus the store version it was committed at; `None` when
/// the closure skipped the write.
#[derive(Debug)]
pub struct TxOutcome<T> {
    pub value: T,
    pub committed_version: Option<u64>,
}

/// Reads the document, runs `mutate` on it and commits with a version check.
/// On conflict the whole cycle restarts with a fresh read, so `mutate` must be
/// pure. Gives up with `TransactionConflict` after the configured attempts.
pub async fn run_transaction<T, F>(
    state: &AppState,
    key: &EntitlementKey,
    mut mutate: F,
) -> Result<TxOutcome<T>, AppError>
where
    F: FnMut(Option<&EntitlementRecord>) -> Result<TxStep<T>, AppError>,
{
    let max_attempts = state.config.transaction_max_attempts.max(1);
    for attempt in 1..=max_attempts {
        let current = state.entitlements.get(key).await?;
        let expected_version = current.as_ref().map(|doc| doc.version);
        let step = mutate(current.as_ref().map(|doc| &doc.value))?;
        let (next, output) = match step {
            TxStep::Skip(value) => {
                return Ok(TxOutcome {
                    value,
                    committed_version: None,
                })
            }
            TxStep::Write(next, output) => (next, output),
        };
        match state.entitlements.commit(key, expected_version, next).await? {
            CommitOutcome::Committed { version } => {
                debug!(key = %key, version, attempt, "entitlement committed");
                return Ok(TxOutcome {
                    value: output,
                    committed_version: Some(version),
                });
            }
            CommitOutcome::Conflict => {
                state.metrics.record_transaction_conflict();
                debug!(key = %key, attempt, "entitlement commit conflict, retrying");
                let backoff = state
                    .config
                    .transaction_backoff_ms
                    .saturating_mul(u64::from(attempt));
                if backoff > 0 && attempt < max_attempts {
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
            }
        }
    }
    state.metrics.record_transaction_failure();
    warn!(key = %key, attempts = max_attempts, "entitlement transaction gave up");
    Err(AppError::TransactionConflict {
        attempts: max_attempts,
    })
}

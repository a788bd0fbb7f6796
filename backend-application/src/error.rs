use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Optimistic retries exhausted; safe to retry the whole request.
    #[error("transaction conflict after {attempts} attempts")]
    TransactionConflict { attempts: u32 },
    #[error("redemption window closed: {0}")]
    ScheduleClosed(String),
    #[error("voucher finalized: {0}")]
    Finalized(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::TransactionConflict { .. })
    }
}

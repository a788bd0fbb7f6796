// Backend Application Layer

pub mod cache;
pub mod commands;
pub mod dtos;
pub mod error;
pub mod hooks;
pub mod metrics;
pub mod queries;
pub mod state;
pub mod transaction;
pub mod validation;

pub use cache::ReadCache;
pub use error::AppError;
pub use hooks::{ChangeAction, CommittedChange, PostCommitHook, PostCommitHooks};
pub use metrics::Metrics;
pub use state::AppState;

// Domain entities

pub mod entitlement;
pub mod event_catalog;
pub mod participant;
pub mod redemption_log;
pub mod runtime_config;
pub mod schedule;
pub mod stats;

pub use entitlement::*;
pub use event_catalog::*;
pub use participant::*;
pub use redemption_log::*;
pub use runtime_config::*;
pub use schedule::*;
pub use stats::*;

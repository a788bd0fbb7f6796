pub mod catalog_handlers;
pub mod entitlement_handlers;
pub mod event_handlers;
pub mod ops_handlers;
pub mod redemption_handlers;
pub mod schedule_handlers;

pub use catalog_handlers::*;
pub use entitlement_handlers::*;
pub use event_handlers::*;
pub use ops_handlers::*;
pub use redemption_handlers::*;
pub use schedule_handlers::*;

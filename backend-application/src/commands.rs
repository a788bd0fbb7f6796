pub mod catalog_commands;
pub mod entitlement_commands;
pub mod log_commands;
pub mod redemption_commands;
pub mod schedule_commands;
pub mod stats_commands;

pub mod catalog_queries;
pub mod entitlement_queries;
pub mod log_queries;
pub mod schedule_queries;
pub mod stats_queries;

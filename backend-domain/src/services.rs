// Domain services: pure rules, no I/O

pub mod entitlement_rules;
pub mod schedule_gate;

pub use entitlement_rules::*;
pub use schedule_gate::*;

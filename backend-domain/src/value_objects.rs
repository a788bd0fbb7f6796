// Domain value objects
pub mod identifiers;
pub mod stats_delta;

pub use identifiers::*;
pub use stats_delta::*;

pub mod clickhouse_log;
pub mod config_files;
pub mod memory_log;
pub mod memory_store;
pub mod participant_directory;

pub use clickhouse_log::*;
pub use config_files::*;
pub use memory_log::*;
pub use memory_store::*;
pub use participant_directory::*;

//! SQLite persistence
//!
//! - `init`: pool creation and idempotent schema creation
//! - `stats`: `StatsGateway` implementation with accumulating upserts

pub mod init;
pub mod stats;

pub use init::{init_database, init_memory_database};
pub use stats::{SqliteStatsGateway, StatRow, TeamRow};

//! # tftstat common library
//!
//! Shared code for the tftstat collector:
//! - Error type used across crates
//! - Configuration loading (TOML + environment) and the region host table
//! - The statistics persistence contract (`StatsGateway`)
//! - SQLite schema and the SQLite-backed gateway

pub mod config;
pub mod db;
pub mod error;
pub mod stats;

pub use error::{Error, Result};
pub use stats::{Placement, StatsGateway};

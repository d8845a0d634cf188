//! Test Helper Utilities
//!
//! Shared utilities for testing tftstat-collector

#![allow(dead_code)]

pub mod fixtures;
pub mod gateway;
pub mod transport;

// Re-export commonly used items
pub use fixtures::{league_json, match_json, participant_json, summoner_json, test_hosts};
pub use gateway::RecordingGateway;
pub use transport::{Reply, ScriptedTransport};

use std::time::Duration;
use tftstat_collector::ClientSettings;

/// Client settings for tests: no token bucket, short backoff, few retries
pub fn test_client_settings() -> ClientSettings {
    ClientSettings {
        requests_per_second: 100,
        rate_limit: false,
        max_in_flight: 16,
        retry_count: 1,
        retry_backoff: Duration::from_millis(5),
        show_logs: false,
    }
}

//! Endpoint path templates
//!
//! Paths are relative to a region host; the client picks the platform or the
//! cluster host. League, summoner and status live on the platform host, match
//! endpoints on the cluster host.

/// Ranked queue whose ladder is collected
pub const RANKED_QUEUE: &str = "RANKED_TFT";

/// Platform status; used to validate the API key at startup
pub const PLATFORM_STATUS: &str = "tft/status/v1/platform-data";

/// Top ranked tiers, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LadderTier {
    Challenger,
    Grandmaster,
    Master,
}

impl LadderTier {
    pub const ALL: [LadderTier; 3] = [
        LadderTier::Challenger,
        LadderTier::Grandmaster,
        LadderTier::Master,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LadderTier::Challenger => "challenger",
            LadderTier::Grandmaster => "grandmaster",
            LadderTier::Master => "master",
        }
    }

    /// Platform-host path listing this tier
    pub fn path(self) -> String {
        format!("tft/league/v1/{}?queue={}", self.as_str(), RANKED_QUEUE)
    }
}

impl std::fmt::Display for LadderTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform-host path resolving a ladder player reference
pub fn summoner_by_id(summoner_id: &str) -> String {
    format!("tft/summoner/v1/summoners/{}", summoner_id)
}

/// Match-history listing window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchHistoryWindow {
    /// Epoch seconds
    pub start_time: i64,
    pub count: u32,
}

impl From<&tftstat_common::config::MatchHistoryConfig> for MatchHistoryWindow {
    fn from(config: &tftstat_common::config::MatchHistoryConfig) -> Self {
        Self {
            start_time: config.start_time,
            count: config.count,
        }
    }
}

/// Cluster-host path listing a player's match ids
pub fn match_ids_by_puuid(puuid: &str, window: MatchHistoryWindow) -> String {
    format!(
        "tft/match/v1/matches/by-puuid/{}/ids?start=0&startTime={}&count={}",
        puuid, window.start_time, window.count
    )
}

/// Cluster-host path of a full match
pub fn match_by_id(match_id: &str) -> String {
    format!("tft/match/v1/matches/{}", match_id)
}

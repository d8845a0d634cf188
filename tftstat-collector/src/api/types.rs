//! Provider API response types
//!
//! Only the fields the collector reads (plus a few cheap ones useful in logs)
//! are decoded; unknown fields are ignored.

use serde::Deserialize;

// ============================================================================
// League (ladder) endpoints
// ============================================================================

/// One ranked tier listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueList {
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub league_id: String,
    #[serde(default)]
    pub queue: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entries: Vec<LadderEntry>,
}

/// Player standing within a tier
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LadderEntry {
    /// Platform-scoped player reference used for identity resolution
    pub summoner_id: String,
    #[serde(default)]
    pub league_points: i32,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub wins: i32,
    #[serde(default)]
    pub losses: i32,
    #[serde(default)]
    pub veteran: bool,
    #[serde(default)]
    pub inactive: bool,
    #[serde(default)]
    pub fresh_blood: bool,
    #[serde(default)]
    pub hot_streak: bool,
}

// ============================================================================
// Summoner endpoint
// ============================================================================

/// Resolved player identity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerIdentity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub puuid: String,
    #[serde(default)]
    pub profile_icon_id: i64,
    #[serde(default)]
    pub revision_date: i64,
    #[serde(default)]
    pub summoner_level: i64,
}

impl PlayerIdentity {
    /// Shortest puuid accepted as real; the provider returns empty or
    /// placeholder values for some deleted or transferred accounts
    pub const MIN_PUUID_LEN: usize = 2;

    /// Whether the puuid can be used to query match history
    pub fn is_usable(&self) -> bool {
        self.puuid.trim().len() >= Self::MIN_PUUID_LEN
    }
}

// ============================================================================
// Match endpoints
// ============================================================================

/// Full match payload
#[derive(Debug, Clone, Deserialize)]
pub struct MatchDetail {
    pub metadata: MatchMetadata,
    pub info: MatchInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchMetadata {
    #[serde(default)]
    pub data_version: String,
    pub match_id: String,
    /// Participant puuids
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchInfo {
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Content set the match was played in
    pub tft_set_number: i64,
    /// Raw client version string, parsed into a patch
    pub game_version: String,
    #[serde(default)]
    pub tft_game_type: String,
    #[serde(default)]
    pub tft_set_core_name: String,
    #[serde(default, rename = "queueId")]
    pub queue_id: i64,
    #[serde(default, rename = "gameCreation")]
    pub game_creation: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Participant {
    pub placement: i64,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub augments: Vec<String>,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub last_round: i64,
    #[serde(default)]
    pub gold_left: i64,
    #[serde(default)]
    pub total_damage_to_players: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Unit {
    pub character_id: String,
    #[serde(default, rename = "itemNames")]
    pub item_names: Vec<String>,
    /// Star level
    #[serde(default)]
    pub tier: i64,
}

//! Provider API surface: response shapes and endpoint paths

pub mod endpoints;
pub mod types;

pub use types::{
    LadderEntry, LeagueList, MatchDetail, MatchInfo, MatchMetadata, Participant, PlayerIdentity,
    Unit,
};

//! JSON payload builders and test hosts

use serde_json::{json, Value};
use tftstat_common::config::RegionHosts;

pub const TAG_VERSION: &str =
    "Linux Version 14.15.604.8769 (Jul 26 2024/16:17:23) [PUBLIC] <Releases/14.15>";

/// Hosts for a fake region: `http://{region}.platform` and `http://{region}.cluster`
pub fn test_hosts(region: &str) -> RegionHosts {
    RegionHosts {
        platform_id: region.to_string(),
        cluster_id: format!("{}-cluster", region),
        platform_base: format!("http://{}.platform", region),
        cluster_base: format!("http://{}.cluster", region),
    }
}

pub fn platform_url(region: &str, path: &str) -> String {
    format!("http://{}.platform/{}", region, path)
}

pub fn cluster_url(region: &str, path: &str) -> String {
    format!("http://{}.cluster/{}", region, path)
}

/// Tier listing with one entry per summoner id
pub fn league_json(tier: &str, summoner_ids: &[&str]) -> Value {
    let entries: Vec<Value> = summoner_ids
        .iter()
        .map(|id| {
            json!({
                "summonerId": id,
                "leaguePoints": 100,
                "rank": "I",
                "wins": 10,
                "losses": 10,
                "veteran": false,
                "inactive": false,
                "freshBlood": false,
                "hotStreak": false
            })
        })
        .collect();

    json!({
        "tier": tier,
        "leagueId": format!("{}-league", tier),
        "queue": "RANKED_TFT",
        "name": "Test League",
        "entries": entries
    })
}

pub fn summoner_json(summoner_id: &str, puuid: &str) -> Value {
    json!({
        "id": summoner_id,
        "accountId": format!("acct-{}", summoner_id),
        "puuid": puuid,
        "profileIconId": 1,
        "revisionDate": 0,
        "summonerLevel": 100
    })
}

/// Participant with `(character, items)` units and augments
pub fn participant_json(placement: i64, units: &[(&str, &[&str])], augments: &[&str]) -> Value {
    let units: Vec<Value> = units
        .iter()
        .map(|(character, items)| {
            json!({
                "character_id": character,
                "itemNames": items,
                "tier": 2
            })
        })
        .collect();

    json!({
        "placement": placement,
        "units": units,
        "augments": augments,
        "level": 8,
        "last_round": 30,
        "gold_left": 0,
        "total_damage_to_players": 120
    })
}

pub fn match_json(match_id: &str, set: i64, game_version: &str, participants: Vec<Value>) -> Value {
    json!({
        "metadata": {
            "data_version": "5",
            "match_id": match_id,
            "participants": []
        },
        "info": {
            "tft_set_number": set,
            "game_version": game_version,
            "tft_game_type": "standard",
            "queueId": 1100,
            "gameCreation": 1722500000000i64,
            "participants": participants
        }
    })
}

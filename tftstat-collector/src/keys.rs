//! Statistical key derivation
//!
//! Keys are pure functions of (set, patch) and the entity identifiers, joined
//! with `~`. Identifiers containing the separator are rejected so two distinct
//! field tuples can never produce the same key.

use crate::api::types::Participant;
use std::fmt;
use tftstat_common::Placement;
use thiserror::Error;

pub const KEY_SEPARATOR: char = '~';

/// Item count a unit must carry to produce a unit+item key
pub const FULL_ITEM_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("Empty {field} identifier")]
    Empty { field: &'static str },

    #[error("{field} identifier {value:?} contains the key separator '~'")]
    ContainsSeparator { field: &'static str, value: String },
}

macro_rules! key_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

key_type!(
    /// `character~set~patch`
    UnitKey
);
key_type!(
    /// `character~set~patch~item1~item2~item3`
    UnitItemKey
);
key_type!(
    /// `augment~set~patch`
    AugmentKey
);
key_type!(
    /// `sorted characters~set~patch`
    TeamKey
);

fn check(field: &'static str, value: &str) -> Result<(), KeyError> {
    if value.is_empty() {
        return Err(KeyError::Empty { field });
    }
    if value.contains(KEY_SEPARATOR) {
        return Err(KeyError::ContainsSeparator {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn scoped(id: &str, set: i64, patch: &str) -> String {
    format!("{id}{sep}{set}{sep}{patch}", sep = KEY_SEPARATOR)
}

pub fn unit_key(character_id: &str, set: i64, patch: &str) -> Result<UnitKey, KeyError> {
    check("character", character_id)?;
    check("patch", patch)?;
    Ok(UnitKey(scoped(character_id, set, patch)))
}

/// Unit+item key; `None` unless the unit carries exactly three items
pub fn unit_item_key(unit: &UnitKey, items: &[String]) -> Result<Option<UnitItemKey>, KeyError> {
    if items.len() != FULL_ITEM_COUNT {
        return Ok(None);
    }

    let mut key = unit.0.clone();
    for item in items {
        check("item", item)?;
        key.push(KEY_SEPARATOR);
        key.push_str(item);
    }
    Ok(Some(UnitItemKey(key)))
}

pub fn augment_key(augment_id: &str, set: i64, patch: &str) -> Result<AugmentKey, KeyError> {
    check("augment", augment_id)?;
    check("patch", patch)?;
    Ok(AugmentKey(scoped(augment_id, set, patch)))
}

/// Composition key; independent of the order `character_ids` arrive in
pub fn team_key<S: AsRef<str>>(
    character_ids: &[S],
    set: i64,
    patch: &str,
) -> Result<TeamKey, KeyError> {
    check("patch", patch)?;
    let mut names = Vec::with_capacity(character_ids.len());
    for id in character_ids {
        let id = id.as_ref();
        check("character", id)?;
        names.push(id);
    }
    names.sort_unstable();

    let joined = names.join(&KEY_SEPARATOR.to_string());
    Ok(TeamKey(scoped(&joined, set, patch)))
}

/// Facts for one unit on a board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFact {
    pub key: UnitKey,
    pub character_id: String,
    pub item_key: Option<UnitItemKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentFact {
    pub key: AugmentKey,
    pub augment_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamFact {
    pub key: TeamKey,
    /// Unit keys of the board, sorted
    pub unit_keys: Vec<String>,
}

/// Everything one participant contributes to the statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantFacts {
    pub set: i64,
    pub patch: String,
    pub placement: Placement,
    pub units: Vec<UnitFact>,
    pub augments: Vec<AugmentFact>,
    pub team: TeamFact,
}

impl ParticipantFacts {
    /// Upserts these facts turn into
    pub fn upsert_count(&self) -> usize {
        let item_keys = self.units.iter().filter(|u| u.item_key.is_some()).count();
        self.units.len() + item_keys + self.augments.len() + 1
    }
}

/// Derive every key for one participant
///
/// `placement` has already been validated by the caller.
pub fn derive_participant_facts(
    participant: &Participant,
    placement: Placement,
    set: i64,
    patch: &str,
) -> Result<ParticipantFacts, KeyError> {
    let mut units = Vec::with_capacity(participant.units.len());
    for unit in &participant.units {
        let key = unit_key(&unit.character_id, set, patch)?;
        let item_key = unit_item_key(&key, &unit.item_names)?;
        units.push(UnitFact {
            key,
            character_id: unit.character_id.clone(),
            item_key,
        });
    }

    let augments = participant
        .augments
        .iter()
        .map(|augment| {
            Ok(AugmentFact {
                key: augment_key(augment, set, patch)?,
                augment_id: augment.clone(),
            })
        })
        .collect::<Result<Vec<_>, KeyError>>()?;

    let names: Vec<&str> = units.iter().map(|u| u.character_id.as_str()).collect();
    let mut unit_keys: Vec<String> = units.iter().map(|u| u.key.to_string()).collect();
    unit_keys.sort();

    Ok(ParticipantFacts {
        set,
        patch: patch.to_string(),
        placement,
        team: TeamFact {
            key: team_key(&names, set, patch)?,
            unit_keys,
        },
        units,
        augments,
    })
}

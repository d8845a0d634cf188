//! In-memory `StatsGateway` that records every call

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tftstat_common::{Error, Placement, Result, StatsGateway};

/// Games and placement sum per key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    pub games: u32,
    pub placement_sum: u32,
}

#[derive(Default)]
struct State {
    processed: HashSet<String>,
    units: HashMap<String, Counter>,
    unit_items: HashMap<String, Counter>,
    augments: HashMap<String, Counter>,
    teams: HashMap<String, (Vec<String>, Counter)>,
    upserts: usize,
}

#[derive(Default)]
pub struct RecordingGateway {
    state: Mutex<State>,
    fail_upserts: AtomicBool,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upsert fail with a database-style error
    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Insert the marker; `false` when it was already present
    pub fn mark(&self, match_id: &str) -> bool {
        self.state.lock().unwrap().processed.insert(match_id.to_string())
    }

    pub fn processed(&self, match_id: &str) -> bool {
        self.state.lock().unwrap().processed.contains(match_id)
    }

    pub fn processed_count(&self) -> usize {
        self.state.lock().unwrap().processed.len()
    }

    pub fn upserts(&self) -> usize {
        self.state.lock().unwrap().upserts
    }

    pub fn unit(&self, key: &str) -> Option<Counter> {
        self.state.lock().unwrap().units.get(key).copied()
    }

    pub fn unit_item(&self, key: &str) -> Option<Counter> {
        self.state.lock().unwrap().unit_items.get(key).copied()
    }

    pub fn augment(&self, key: &str) -> Option<Counter> {
        self.state.lock().unwrap().augments.get(key).copied()
    }

    pub fn team(&self, key: &str) -> Option<(Vec<String>, Counter)> {
        self.state.lock().unwrap().teams.get(key).cloned()
    }

    pub fn unit_item_count(&self) -> usize {
        self.state.lock().unwrap().unit_items.len()
    }

    fn check(&self) -> Result<()> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(Error::InvalidInput("injected upsert failure".to_string()));
        }
        Ok(())
    }
}

fn bump(counter: &mut Counter, placement: Placement) {
    counter.games += 1;
    counter.placement_sum += u32::from(placement);
}

#[async_trait]
impl StatsGateway for RecordingGateway {
    async fn is_processed(&self, match_id: &str) -> Result<bool> {
        Ok(self.processed(match_id))
    }

    async fn mark_processed(&self, match_id: &str) -> Result<bool> {
        Ok(self.mark(match_id))
    }

    async fn upsert_unit(&self, key: &str, _character_id: &str, placement: Placement) -> Result<()> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        bump(state.units.entry(key.to_string()).or_default(), placement);
        state.upserts += 1;
        Ok(())
    }

    async fn upsert_unit_item(&self, key: &str, _unit_key: &str, placement: Placement) -> Result<()> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        bump(state.unit_items.entry(key.to_string()).or_default(), placement);
        state.upserts += 1;
        Ok(())
    }

    async fn upsert_augment(&self, key: &str, _augment_id: &str, placement: Placement) -> Result<()> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        bump(state.augments.entry(key.to_string()).or_default(), placement);
        state.upserts += 1;
        Ok(())
    }

    async fn upsert_team(
        &self,
        key: &str,
        _set_number: i64,
        _patch: &str,
        unit_keys: &[String],
        placement: Placement,
    ) -> Result<()> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let entry = state
            .teams
            .entry(key.to_string())
            .or_insert_with(|| (unit_keys.to_vec(), Counter::default()));
        bump(&mut entry.1, placement);
        state.upserts += 1;
        Ok(())
    }
}

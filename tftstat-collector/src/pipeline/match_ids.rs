//! Match-id collection and deduplication

use super::fan_out::{fan_out, FanOutStats};
use crate::api::endpoints::{match_ids_by_puuid, MatchHistoryWindow};
use crate::api::types::PlayerIdentity;
use crate::client::RateLimitedClient;
use crate::error::FetchError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Unique match ids shared by concurrent producers
#[derive(Debug, Clone, Default)]
pub struct MatchIdSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl MatchIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an id; returns `false` when it was already present
    pub fn insert(&self, match_id: impl Into<String>) -> bool {
        match self.inner.lock() {
            Ok(mut set) => set.insert(match_id.into()),
            Err(poisoned) => poisoned.into_inner().insert(match_id.into()),
        }
    }

    pub fn extend<I: IntoIterator<Item = String>>(&self, ids: I) -> usize {
        ids.into_iter().filter(|id| self.insert(id.clone())).count()
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(set) => set.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, match_id: &str) -> bool {
        match self.inner.lock() {
            Ok(set) => set.contains(match_id),
            Err(poisoned) => poisoned.into_inner().contains(match_id),
        }
    }

    /// Snapshot of the ids in unspecified order
    pub fn into_vec(self) -> Vec<String> {
        match self.inner.lock() {
            Ok(set) => set.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MatchIdOutcome {
    pub ids: MatchIdSet,
    /// Ids returned across all players, before deduplication
    pub reported: usize,
    pub failed: usize,
    pub stats: FanOutStats,
}

/// List recent match ids for every identity and merge them into one set
///
/// Producers insert directly into the shared set as their listings arrive.
pub async fn collect_match_ids(
    client: Arc<RateLimitedClient>,
    identities: Vec<PlayerIdentity>,
    window: MatchHistoryWindow,
) -> MatchIdOutcome {
    let ids = MatchIdSet::new();
    let mut reported = 0usize;
    let mut failed = 0usize;

    let stats = fan_out(
        identities,
        |identity| {
            let client = Arc::clone(&client);
            let ids = ids.clone();
            async move {
                let path = match_ids_by_puuid(&identity.puuid, window);
                match client.fetch_json::<Vec<String>>(&path, true).await {
                    Ok(listed) => {
                        let count = listed.len();
                        ids.extend(listed);
                        Ok(count)
                    }
                    Err(e) => Err((identity.puuid, e)),
                }
            }
        },
        |result: Result<usize, (String, FetchError)>| match result {
            Ok(count) => reported += count,
            Err((puuid, e)) => {
                warn!(region = client.region(), puuid = %puuid, error = %e, "Match id listing failed, dropping player");
                failed += 1;
            }
        },
    )
    .await;

    info!(
        region = client.region(),
        reported,
        unique = ids.len(),
        failed,
        "Match id collection complete"
    );

    MatchIdOutcome {
        ids,
        reported,
        failed,
        stats,
    }
}

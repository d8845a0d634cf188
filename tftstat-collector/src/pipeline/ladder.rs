//! Ladder collection: challenger, grandmaster and master tiers

use crate::api::endpoints::LadderTier;
use crate::api::types::{LadderEntry, LeagueList};
use crate::client::RateLimitedClient;
use crate::error::FetchError;
use tracing::{info, warn};

/// Entries gathered from every tier that answered
#[derive(Debug, Default)]
pub struct LadderOutcome {
    /// Challenger, then grandmaster, then master entries; duplicates kept
    pub entries: Vec<LadderEntry>,
    pub failed_tiers: Vec<(LadderTier, FetchError)>,
}

/// Fetch the three top tiers concurrently and concatenate them in tier order
///
/// A failing tier is logged and reported; entries from the other tiers are kept.
pub async fn collect_ladder(client: &RateLimitedClient) -> LadderOutcome {
    let [challenger, grandmaster, master] = LadderTier::ALL;
    let (a, b, c) = tokio::join!(
        fetch_tier(client, challenger),
        fetch_tier(client, grandmaster),
        fetch_tier(client, master),
    );

    let mut outcome = LadderOutcome::default();
    for (tier, result) in [(challenger, a), (grandmaster, b), (master, c)] {
        match result {
            Ok(list) => {
                info!(region = client.region(), tier = %tier, entries = list.entries.len(), "Tier fetched");
                outcome.entries.extend(list.entries);
            }
            Err(e) => {
                warn!(region = client.region(), tier = %tier, error = %e, "Tier fetch failed, continuing with remaining tiers");
                outcome.failed_tiers.push((tier, e));
            }
        }
    }

    outcome
}

async fn fetch_tier(client: &RateLimitedClient, tier: LadderTier) -> Result<LeagueList, FetchError> {
    client.fetch_json(&tier.path(), false).await
}

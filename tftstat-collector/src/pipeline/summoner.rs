//! Identity resolution for ladder entries

use super::fan_out::{fan_out, FanOutStats};
use crate::api::endpoints::summoner_by_id;
use crate::api::types::{LadderEntry, PlayerIdentity};
use crate::client::RateLimitedClient;
use crate::error::FetchError;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct ResolveOutcome {
    /// Identities with a usable puuid
    pub identities: Vec<PlayerIdentity>,
    /// Lookups that returned an error
    pub failed: usize,
    /// Lookups that succeeded but carried an unusable puuid
    pub unusable: usize,
    pub stats: FanOutStats,
}

/// Resolve every ladder entry to a player identity, one task per entry
pub async fn resolve_identities(
    client: Arc<RateLimitedClient>,
    entries: Vec<LadderEntry>,
) -> ResolveOutcome {
    let mut outcome = ResolveOutcome::default();

    let stats = fan_out(
        entries,
        |entry| {
            let client = Arc::clone(&client);
            async move {
                let result = client
                    .fetch_json::<PlayerIdentity>(&summoner_by_id(&entry.summoner_id), false)
                    .await;
                (entry.summoner_id, result)
            }
        },
        |(summoner_id, result): (String, Result<PlayerIdentity, FetchError>)| match result {
            Ok(identity) if identity.is_usable() => outcome.identities.push(identity),
            Ok(_) => {
                debug!(region = client.region(), summoner_id = %summoner_id, "Identity has unusable puuid, dropping");
                outcome.unusable += 1;
            }
            Err(e) => {
                warn!(region = client.region(), summoner_id = %summoner_id, error = %e, "Identity resolution failed, dropping");
                outcome.failed += 1;
            }
        },
    )
    .await;

    outcome.stats = stats;
    info!(
        region = client.region(),
        resolved = outcome.identities.len(),
        failed = outcome.failed,
        unusable = outcome.unusable,
        "Identity resolution complete"
    );
    outcome
}

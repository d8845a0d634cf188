//! Match ingestion
//!
//! Per match id:
//! 1. Skip when the processed marker is already set
//! 2. Fetch the match; a failed fetch leaves the id unmarked for a later run
//! 3. Claim the processed marker as soon as the payload is in hand; losing
//!    the claim to a concurrent ingestor counts as already processed
//! 4. Parse the patch and derive every participant's keys
//! 5. Issue the upserts
//!
//! Failures are scoped to the id that produced them.

use super::fan_out::{fan_out, FanOutStats};
use crate::api::endpoints::match_by_id;
use crate::api::types::MatchDetail;
use crate::client::RateLimitedClient;
use crate::error::{DeriveError, IngestError};
use crate::keys::{derive_participant_facts, ParticipantFacts};
use crate::patch::parse_patch;
use std::sync::Arc;
use tftstat_common::{Placement, StatsGateway};
use tracing::{debug, info, warn};

/// Lowest and highest valid placements in an eight-player lobby
const PLACEMENT_RANGE: std::ops::RangeInclusive<i64> = 1..=8;

/// Result of ingesting one match id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Marker already present or claimed by a concurrent ingestor; nothing written
    AlreadyProcessed,
    Ingested {
        participants: usize,
        /// Participants dropped for an out-of-range placement
        skipped_participants: usize,
        upserts: usize,
    },
}

/// Tallies for one ingestion stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub ingested: usize,
    pub already_processed: usize,
    pub fetch_failed: usize,
    pub derive_failed: usize,
    pub persist_failed: usize,
    pub cancelled: usize,
    pub skipped_participants: usize,
    pub upserts: usize,
    pub stats: FanOutStats,
}

impl IngestReport {
    fn record(&mut self, match_id: &str, result: Result<IngestOutcome, IngestError>) {
        match result {
            Ok(IngestOutcome::AlreadyProcessed) => {
                debug!(match_id, "Match already processed, skipping");
                self.already_processed += 1;
            }
            Ok(IngestOutcome::Ingested {
                skipped_participants,
                upserts,
                ..
            }) => {
                self.ingested += 1;
                self.skipped_participants += skipped_participants;
                self.upserts += upserts;
            }
            Err(IngestError::Fetch(e)) if e.is_cancelled() => self.cancelled += 1,
            Err(IngestError::Fetch(e)) => {
                warn!(match_id, error = %e, "Match fetch failed, leaving unmarked for retry");
                self.fetch_failed += 1;
            }
            Err(IngestError::Derive(e)) => {
                warn!(match_id, error = %e, "Match marked processed but keys could not be derived");
                self.derive_failed += 1;
            }
            Err(IngestError::Persistence(e)) => {
                warn!(match_id, error = %e, "Match persistence failed");
                self.persist_failed += 1;
            }
        }
    }
}

/// Turns match ids into accumulated statistics
#[derive(Clone)]
pub struct MatchIngestor {
    client: Arc<RateLimitedClient>,
    gateway: Arc<dyn StatsGateway>,
}

impl MatchIngestor {
    pub fn new(client: Arc<RateLimitedClient>, gateway: Arc<dyn StatsGateway>) -> Self {
        Self { client, gateway }
    }

    /// Ingest a single match id
    pub async fn ingest_one(&self, match_id: &str) -> Result<IngestOutcome, IngestError> {
        if self.gateway.is_processed(match_id).await? {
            return Ok(IngestOutcome::AlreadyProcessed);
        }

        let detail: MatchDetail = self.client.fetch_json(&match_by_id(match_id), true).await?;

        if !self.gateway.mark_processed(match_id).await? {
            debug!(match_id, "Processed marker claimed by another ingestor");
            return Ok(IngestOutcome::AlreadyProcessed);
        }

        let (facts, skipped_participants) = derive_match_facts(match_id, &detail)?;

        let mut upserts = 0;
        for participant in &facts {
            self.persist(participant).await?;
            upserts += participant.upsert_count();
        }

        Ok(IngestOutcome::Ingested {
            participants: facts.len(),
            skipped_participants,
            upserts,
        })
    }

    /// Ingest every id concurrently, one task per id
    pub async fn ingest_all(&self, match_ids: Vec<String>) -> IngestReport {
        let mut report = IngestReport::default();
        let total = match_ids.len();

        let stats = fan_out(
            match_ids,
            |match_id| {
                let ingestor = self.clone();
                async move {
                    let result = ingestor.ingest_one(&match_id).await;
                    (match_id, result)
                }
            },
            |(match_id, result): (String, Result<IngestOutcome, IngestError>)| {
                report.record(&match_id, result)
            },
        )
        .await;
        report.stats = stats;

        info!(
            region = self.client.region(),
            total,
            ingested = report.ingested,
            already_processed = report.already_processed,
            fetch_failed = report.fetch_failed,
            derive_failed = report.derive_failed,
            persist_failed = report.persist_failed,
            cancelled = report.cancelled,
            upserts = report.upserts,
            "Match ingestion complete"
        );
        report
    }

    async fn persist(&self, facts: &ParticipantFacts) -> Result<(), IngestError> {
        let placement = facts.placement;

        for unit in &facts.units {
            self.gateway
                .upsert_unit(unit.key.as_str(), &unit.character_id, placement)
                .await?;

            if let Some(item_key) = &unit.item_key {
                self.gateway
                    .upsert_unit_item(item_key.as_str(), unit.key.as_str(), placement)
                    .await?;
            }
        }

        for augment in &facts.augments {
            self.gateway
                .upsert_augment(augment.key.as_str(), &augment.augment_id, placement)
                .await?;
        }

        self.gateway
            .upsert_team(
                facts.team.key.as_str(),
                facts.set,
                &facts.patch,
                &facts.team.unit_keys,
                placement,
            )
            .await?;

        Ok(())
    }
}

/// Derive keys for every participant with a valid placement
///
/// Nothing is written until every participant has derived cleanly.
fn derive_match_facts(
    match_id: &str,
    detail: &MatchDetail,
) -> Result<(Vec<ParticipantFacts>, usize), DeriveError> {
    let set = detail.info.tft_set_number;
    let patch = parse_patch(&detail.info.game_version)?;

    let mut facts = Vec::with_capacity(detail.info.participants.len());
    let mut skipped = 0;

    for participant in &detail.info.participants {
        if !PLACEMENT_RANGE.contains(&participant.placement) {
            warn!(
                match_id,
                placement = participant.placement,
                "Participant placement out of range, skipping"
            );
            skipped += 1;
            continue;
        }
        let placement = participant.placement as Placement;
        facts.push(derive_participant_facts(participant, placement, set, &patch)?);
    }

    Ok((facts, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(game_version: &str, placements: &[i64]) -> MatchDetail {
        let participants: Vec<serde_json::Value> = placements
            .iter()
            .map(|p| {
                serde_json::json!({
                    "placement": p,
                    "augments": ["Aug"],
                    "units": [{"character_id": "Ashe", "itemNames": ["A", "B", "C"]}]
                })
            })
            .collect();

        serde_json::from_value(serde_json::json!({
            "metadata": {"match_id": "NA1_1"},
            "info": {
                "tft_set_number": 12,
                "game_version": game_version,
                "participants": participants
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_out_of_range_placements_skipped() {
        let detail = detail("<Releases/14.15>", &[1, 0, 9, 8]);
        let (facts, skipped) = derive_match_facts("NA1_1", &detail).unwrap();
        assert_eq!(facts.len(), 2);
        assert_eq!(skipped, 2);
        assert_eq!(facts[0].placement, 1);
        assert_eq!(facts[1].placement, 8);
    }

    #[test]
    fn test_unparseable_patch_is_derive_error() {
        let detail = detail("garbage", &[1]);
        assert!(matches!(
            derive_match_facts("NA1_1", &detail),
            Err(DeriveError::Patch(_))
        ));
    }
}

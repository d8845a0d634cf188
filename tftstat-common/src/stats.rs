//! Statistics persistence contract
//!
//! The collector writes through this trait only. Every operation is
//! idempotent with respect to the processed marker and accumulating with
//! respect to the statistic rows: one call adds one observed game to the row
//! identified by `key`.

use crate::Result;
use async_trait::async_trait;

/// Final standing of a participant (1 = winner, 8 = last)
pub type Placement = u8;

/// Highest placement counted as a top-four finish
pub const TOP_FOUR: Placement = 4;

/// Persistence operations used by match ingestion
#[async_trait]
pub trait StatsGateway: Send + Sync {
    /// Has this match already been ingested by any previous run?
    async fn is_processed(&self, match_id: &str) -> Result<bool>;

    /// Record that this match has been ingested
    ///
    /// Returns `true` only for the call that inserted the marker; a marker
    /// that already existed yields `false` and the caller must not write.
    async fn mark_processed(&self, match_id: &str) -> Result<bool>;

    /// Add one game for a unit
    async fn upsert_unit(&self, key: &str, character_id: &str, placement: Placement) -> Result<()>;

    /// Add one game for a unit carrying a specific three-item build
    async fn upsert_unit_item(&self, key: &str, unit_key: &str, placement: Placement) -> Result<()>;

    /// Add one game for an augment
    async fn upsert_augment(&self, key: &str, augment_id: &str, placement: Placement) -> Result<()>;

    /// Add one game for a team composition
    async fn upsert_team(
        &self,
        key: &str,
        set_number: i64,
        patch: &str,
        unit_keys: &[String],
        placement: Placement,
    ) -> Result<()>;
}

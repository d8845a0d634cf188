//! Collection pipeline stages
//!
//! ladder → identities → match ids → ingestion. Every stage after the ladder
//! fans out one task per input with `fan_out`.

pub mod fan_out;
pub mod ingest;
pub mod ladder;
pub mod match_ids;
pub mod summoner;

pub use fan_out::{fan_out, FanOutStats};
pub use ingest::{IngestOutcome, IngestReport, MatchIngestor};
pub use ladder::{collect_ladder, LadderOutcome};
pub use match_ids::{collect_match_ids, MatchIdOutcome, MatchIdSet};
pub use summoner::{resolve_identities, ResolveOutcome};

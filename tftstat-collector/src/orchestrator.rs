//! Region orchestration
//!
//! `Orchestrator::build` performs every startup check (API key present,
//! regions known, key accepted by each region's status endpoint) before any
//! pipeline stage runs. `run` then executes one full pipeline per region
//! concurrently and waits for all of them.

use crate::api::endpoints::{LadderTier, MatchHistoryWindow};
use crate::client::{ClientSettings, HttpTransport, RateLimitedClient};
use crate::error::StartupError;
use crate::pipeline::ingest::{IngestReport, MatchIngestor};
use crate::pipeline::{collect_ladder, collect_match_ids, resolve_identities};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tftstat_common::config::RegionTable;
use tftstat_common::StatsGateway;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Everything needed to build the per-region pipelines
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub api_key: String,
    /// Platform ids to collect, in the order given
    pub regions: Vec<String>,
    pub region_table: RegionTable,
    pub client: ClientSettings,
    pub window: MatchHistoryWindow,
}

/// Summary of one region's run
#[derive(Debug, Clone)]
pub struct RegionReport {
    pub region: String,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub ladder_entries: usize,
    pub failed_tiers: Vec<LadderTier>,
    pub identities: usize,
    pub identity_failures: usize,
    pub unusable_identities: usize,
    /// Ids listed across all players, before deduplication
    pub match_ids_reported: usize,
    pub unique_match_ids: usize,
    pub match_id_failures: usize,
    pub ingest: IngestReport,
    /// Run stopped early because cancellation was requested
    pub cancelled: bool,
    /// Requests dispatched by this region's client, retries included
    pub dispatches: u64,
}

impl RegionReport {
    fn new(region: &str, run_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            region: region.to_string(),
            run_id,
            started_at: now,
            finished_at: now,
            ladder_entries: 0,
            failed_tiers: Vec::new(),
            identities: 0,
            identity_failures: 0,
            unusable_identities: 0,
            match_ids_reported: 0,
            unique_match_ids: 0,
            match_id_failures: 0,
            ingest: IngestReport::default(),
            cancelled: false,
            dispatches: 0,
        }
    }
}

/// One region's client and ingestor
struct RegionPipeline {
    client: Arc<RateLimitedClient>,
    ingestor: MatchIngestor,
    window: MatchHistoryWindow,
}

impl RegionPipeline {
    async fn run(self, run_id: Uuid) -> RegionReport {
        let mut report = RegionReport::new(self.client.region(), run_id);
        let cancel = self.client.cancel_token().clone();
        info!("Region run started");

        let ladder = collect_ladder(&self.client).await;
        report.ladder_entries = ladder.entries.len();
        report.failed_tiers = ladder.failed_tiers.iter().map(|(tier, _)| *tier).collect();

        if !cancel.is_cancelled() {
            let resolved = resolve_identities(Arc::clone(&self.client), ladder.entries).await;
            report.identities = resolved.identities.len();
            report.identity_failures = resolved.failed;
            report.unusable_identities = resolved.unusable;

            if !cancel.is_cancelled() {
                let listed =
                    collect_match_ids(Arc::clone(&self.client), resolved.identities, self.window)
                        .await;
                report.match_ids_reported = listed.reported;
                report.unique_match_ids = listed.ids.len();
                report.match_id_failures = listed.failed;

                if !cancel.is_cancelled() {
                    report.ingest = self.ingestor.ingest_all(listed.ids.into_vec()).await;
                }
            }
        }

        report.cancelled = cancel.is_cancelled();
        report.dispatches = self.client.dispatch_count();
        report.finished_at = Utc::now();

        info!(
            ladder_entries = report.ladder_entries,
            identities = report.identities,
            unique_match_ids = report.unique_match_ids,
            ingested = report.ingest.ingested,
            already_processed = report.ingest.already_processed,
            upserts = report.ingest.upserts,
            dispatches = report.dispatches,
            cancelled = report.cancelled,
            "Region run finished"
        );
        report
    }
}

/// Validated set of region pipelines ready to run
pub struct Orchestrator {
    pipelines: Vec<RegionPipeline>,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Validate configuration and the API key for every region
    ///
    /// Any failure here is fatal; no pipeline is returned.
    pub async fn build(
        settings: CollectorSettings,
        transport: Arc<dyn HttpTransport>,
        gateway: Arc<dyn StatsGateway>,
        cancel: CancellationToken,
    ) -> Result<Self, StartupError> {
        let api_key = settings.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(StartupError::MissingApiKey);
        }

        let mut regions: Vec<&str> = Vec::new();
        for region in &settings.regions {
            if !regions.contains(&region.as_str()) {
                regions.push(region);
            }
        }
        if regions.is_empty() {
            return Err(StartupError::NoRegions);
        }

        let mut clients = Vec::with_capacity(regions.len());
        for region in regions {
            let hosts = settings
                .region_table
                .lookup(region)
                .map_err(StartupError::UnknownRegion)?;
            clients.push(Arc::new(RateLimitedClient::new(
                hosts.clone(),
                api_key.clone(),
                Arc::clone(&transport),
                settings.client.clone(),
                cancel.clone(),
            )));
        }

        let checks = join_all(clients.iter().map(|client| client.validate_api_key())).await;
        for (client, check) in clients.iter().zip(checks) {
            match check {
                Ok(()) => info!(region = client.region(), "API key accepted"),
                Err(e) if e.is_auth() => {
                    error!(region = client.region(), error = %e, "API key rejected");
                    return Err(StartupError::Unauthorized {
                        region: client.region().to_string(),
                        source: e,
                    });
                }
                Err(e) => {
                    error!(region = client.region(), error = %e, "API key validation failed");
                    return Err(StartupError::Validation {
                        region: client.region().to_string(),
                        source: e,
                    });
                }
            }
        }

        let pipelines = clients
            .into_iter()
            .map(|client| RegionPipeline {
                ingestor: MatchIngestor::new(Arc::clone(&client), Arc::clone(&gateway)),
                client,
                window: settings.window,
            })
            .collect();

        Ok(Self { pipelines, cancel })
    }

    /// Platform ids that will be collected
    pub fn regions(&self) -> Vec<&str> {
        self.pipelines.iter().map(|p| p.client.region()).collect()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run every region concurrently and wait for all of them
    pub async fn run(self) -> Vec<RegionReport> {
        let mut tasks = JoinSet::new();

        for pipeline in self.pipelines {
            let run_id = Uuid::new_v4();
            let span = info_span!("region", region = %pipeline.client.region(), run_id = %run_id);
            tasks.spawn(pipeline.run(run_id).instrument(span));
        }

        let mut reports = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => error!(error = %e, "Region run did not complete"),
            }
        }

        if self.cancel.is_cancelled() {
            warn!("Run cancelled; reports are partial");
        }
        reports.sort_by(|a, b| a.region.cmp(&b.region));
        reports
    }
}

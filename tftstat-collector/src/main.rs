//! tftstat-collector - Main entry point
//!
//! Runs one collection pass over every configured region and exits. Ctrl+C or
//! SIGTERM cancels in-flight work; rows already written stay written.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tftstat_collector::api::endpoints::MatchHistoryWindow;
use tftstat_collector::{
    ClientSettings, CollectorSettings, Orchestrator, RegionReport, ReqwestTransport,
};
use tftstat_common::config::{self, RegionTable};
use tftstat_common::db::{init_database, SqliteStatsGateway};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for tftstat-collector
#[derive(Parser, Debug)]
#[command(name = "tftstat-collector")]
#[command(about = "Collect ranked TFT match statistics into SQLite")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "TFTSTAT_DATABASE")]
    database: Option<PathBuf>,

    /// Provider API key
    #[arg(long, env = "RIOT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Platform region to collect (repeatable); overrides the config list
    #[arg(short, long = "region")]
    regions: Vec<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before logging starts so the configured level can apply
    let (toml_config, config_source) = config::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| toml_config.logging.level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tftstat_collector={level},tftstat_common={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tftstat-collector v{}", env!("CARGO_PKG_VERSION"));
    config_source.log();

    let api_key = config::resolve_api_key(args.api_key.as_deref(), &toml_config)?;
    let region_table = RegionTable::from_config(&toml_config)?;
    let regions = if args.regions.is_empty() {
        toml_config.regions.clone()
    } else {
        args.regions.clone()
    };

    let db_path = args
        .database
        .clone()
        .or_else(|| toml_config.database_path.clone())
        .unwrap_or_else(config::default_database_path);
    info!("Database: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    let gateway = Arc::new(SqliteStatsGateway::new(pool));

    let transport = ReqwestTransport::new(Duration::from_secs(toml_config.client.timeout_secs))
        .context("Failed to build HTTP transport")?;

    let settings = CollectorSettings {
        api_key,
        regions,
        region_table,
        client: ClientSettings::from(&toml_config.client),
        window: MatchHistoryWindow::from(&toml_config.match_history),
    };

    let cancel = CancellationToken::new();
    let orchestrator = Orchestrator::build(settings, Arc::new(transport), gateway, cancel.clone())
        .await
        .context("Startup validation failed")?;
    info!("Collecting regions: {}", orchestrator.regions().join(", "));

    let shutdown = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            cancel.cancel();
        })
    };

    let reports = orchestrator.run().await;
    shutdown.abort();

    for report in &reports {
        log_summary(report);
    }

    if reports.iter().any(|r| r.cancelled) {
        bail!("Run cancelled before completion");
    }

    info!("Collection complete");
    Ok(())
}

fn log_summary(report: &RegionReport) {
    let elapsed = report.finished_at - report.started_at;
    let ingest = &report.ingest;

    info!(
        region = %report.region,
        run_id = %report.run_id,
        elapsed_secs = elapsed.num_seconds(),
        ladder_entries = report.ladder_entries,
        identities = report.identities,
        unique_match_ids = report.unique_match_ids,
        ingested = ingest.ingested,
        already_processed = ingest.already_processed,
        upserts = ingest.upserts,
        dispatches = report.dispatches,
        "Region summary"
    );

    let failures = report.failed_tiers.len()
        + report.identity_failures
        + report.match_id_failures
        + ingest.fetch_failed
        + ingest.derive_failed
        + ingest.persist_failed;
    if failures > 0 {
        warn!(
            region = %report.region,
            failed_tiers = ?report.failed_tiers,
            identity_failures = report.identity_failures,
            match_id_failures = report.match_id_failures,
            fetch_failed = ingest.fetch_failed,
            derive_failed = ingest.derive_failed,
            persist_failed = ingest.persist_failed,
            "Region finished with skipped work"
        );
    }
}

/// Completes on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, cancelling run");
        },
        _ = terminate => {
            info!("Received terminate signal, cancelling run");
        },
    }
}

//! Database initialization
//!
//! Opens (or creates) the SQLite statistics database and creates every table
//! idempotently. Safe to call on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Open the statistics database, creating file and tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Three region pipelines write concurrently; WAL keeps readers off the writer's lock
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_tables(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Limited to one connection: every SQLite memory connection is its own database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables if they don't exist
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_processed_matches_table(pool).await?;
    create_unit_stats_table(pool).await?;
    create_unit_item_stats_table(pool).await?;
    create_augment_stats_table(pool).await?;
    create_team_stats_table(pool).await?;

    tracing::debug!("Database tables initialized");
    Ok(())
}

async fn create_processed_matches_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS processed_matches (
            match_id TEXT PRIMARY KEY,
            processed_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_unit_stats_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS unit_stats (
            key TEXT PRIMARY KEY,
            character_id TEXT NOT NULL,
            games INTEGER NOT NULL DEFAULT 0,
            placement_sum INTEGER NOT NULL DEFAULT 0,
            top4 INTEGER NOT NULL DEFAULT 0,
            wins INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_unit_item_stats_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS unit_item_stats (
            key TEXT PRIMARY KEY,
            unit_key TEXT NOT NULL,
            games INTEGER NOT NULL DEFAULT 0,
            placement_sum INTEGER NOT NULL DEFAULT 0,
            top4 INTEGER NOT NULL DEFAULT 0,
            wins INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_unit_item_stats_unit_key ON unit_item_stats(unit_key)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_augment_stats_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS augment_stats (
            key TEXT PRIMARY KEY,
            augment_id TEXT NOT NULL,
            games INTEGER NOT NULL DEFAULT 0,
            placement_sum INTEGER NOT NULL DEFAULT 0,
            top4 INTEGER NOT NULL DEFAULT 0,
            wins INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_team_stats_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS team_stats (
            key TEXT PRIMARY KEY,
            set_number INTEGER NOT NULL,
            patch TEXT NOT NULL,
            unit_keys TEXT NOT NULL,
            games INTEGER NOT NULL DEFAULT 0,
            placement_sum INTEGER NOT NULL DEFAULT 0,
            top4 INTEGER NOT NULL DEFAULT 0,
            wins INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_team_stats_set_patch ON team_stats(set_number, patch)")
        .execute(pool)
        .await?;

    Ok(())
}

//! Concurrent writers against the SQLite gateway
//!
//! Region pipelines write the same statistic keys at the same time; counts
//! must add up rather than overwrite.

use std::sync::Arc;
use tempfile::TempDir;
use tftstat_common::db::{init_database, SqliteStatsGateway};
use tftstat_common::StatsGateway;
use tokio::task::JoinSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_unit_upserts_accumulate() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("stats.db")).await.unwrap();
    let gateway = Arc::new(SqliteStatsGateway::new(pool));

    let mut join_set = JoinSet::new();
    for i in 0..24u8 {
        let gateway = Arc::clone(&gateway);
        join_set.spawn(async move {
            let placement = (i % 8) + 1;
            gateway
                .upsert_unit("TFT12_Ashe~12~14.15", "TFT12_Ashe", placement)
                .await
                .expect("upsert failed");
        });
    }
    while let Some(result) = join_set.join_next().await {
        result.expect("Task panicked");
    }

    let row = gateway.load_unit("TFT12_Ashe~12~14.15").await.unwrap().unwrap();
    assert_eq!(row.games, 24);
    // Each placement 1..=8 seen three times
    assert_eq!(row.placement_sum, 3 * 36);
    assert_eq!(row.top4, 12);
    assert_eq!(row.wins, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mark_processed_single_row() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("stats.db")).await.unwrap();
    let gateway = Arc::new(SqliteStatsGateway::new(pool));

    let mut join_set = JoinSet::new();
    for _ in 0..10 {
        let gateway = Arc::clone(&gateway);
        join_set.spawn(async move { gateway.mark_processed("KR_42").await });
    }
    let mut claimed = 0;
    while let Some(result) = join_set.join_next().await {
        if result.expect("Task panicked").expect("mark failed") {
            claimed += 1;
        }
    }

    // Exactly one writer wins the marker
    assert_eq!(claimed, 1);
    assert_eq!(gateway.count_processed().await.unwrap(), 1);
}

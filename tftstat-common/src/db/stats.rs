//! SQLite statistics gateway
//!
//! Each statistic row accumulates: `games` counts observations,
//! `placement_sum` allows average placement, `top4`/`wins` count strong
//! finishes. Concurrent upserts from several region pipelines add up instead of
//! overwriting each other.

use crate::stats::{Placement, StatsGateway, TOP_FOUR};
use crate::{Error, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

/// Accumulated counters for one unit, unit-item or augment key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRow {
    pub key: String,
    /// character id, unit key or augment id depending on the table
    pub subject: String,
    pub games: i64,
    pub placement_sum: i64,
    pub top4: i64,
    pub wins: i64,
}

impl StatRow {
    /// Mean placement over all observed games
    pub fn average_placement(&self) -> Option<f64> {
        (self.games > 0).then(|| self.placement_sum as f64 / self.games as f64)
    }
}

/// Accumulated counters for one team composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRow {
    pub key: String,
    pub set_number: i64,
    pub patch: String,
    pub unit_keys: Vec<String>,
    pub games: i64,
    pub placement_sum: i64,
    pub top4: i64,
    pub wins: i64,
}

/// Counted tables sharing the same shape
#[derive(Debug, Clone, Copy)]
enum CountedTable {
    Unit,
    UnitItem,
    Augment,
}

impl CountedTable {
    fn table(self) -> &'static str {
        match self {
            CountedTable::Unit => "unit_stats",
            CountedTable::UnitItem => "unit_item_stats",
            CountedTable::Augment => "augment_stats",
        }
    }

    fn subject_column(self) -> &'static str {
        match self {
            CountedTable::Unit => "character_id",
            CountedTable::UnitItem => "unit_key",
            CountedTable::Augment => "augment_id",
        }
    }
}

/// `StatsGateway` backed by a SQLite pool
#[derive(Clone)]
pub struct SqliteStatsGateway {
    pool: SqlitePool,
}

impl SqliteStatsGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn upsert_counted(
        &self,
        table: CountedTable,
        key: &str,
        subject: &str,
        placement: Placement,
    ) -> Result<()> {
        validate_placement(placement)?;
        let (top4, win) = finish_flags(placement);

        let sql = format!(
            r#"
            INSERT INTO {table} ({subject}, key, games, placement_sum, top4, wins)
            VALUES (?, ?, 1, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                games = games + 1,
                placement_sum = placement_sum + excluded.placement_sum,
                top4 = top4 + excluded.top4,
                wins = wins + excluded.wins,
                updated_at = CURRENT_TIMESTAMP
            "#,
            table = table.table(),
            subject = table.subject_column(),
        );

        sqlx::query(&sql)
            .bind(subject)
            .bind(key)
            .bind(i64::from(placement))
            .bind(top4)
            .bind(win)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn load_counted(&self, table: CountedTable, key: &str) -> Result<Option<StatRow>> {
        let sql = format!(
            "SELECT key, {subject} AS subject, games, placement_sum, top4, wins FROM {table} WHERE key = ?",
            table = table.table(),
            subject = table.subject_column(),
        );

        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| StatRow {
            key: row.get("key"),
            subject: row.get("subject"),
            games: row.get("games"),
            placement_sum: row.get("placement_sum"),
            top4: row.get("top4"),
            wins: row.get("wins"),
        }))
    }

    /// Load a unit row (verification helper)
    pub async fn load_unit(&self, key: &str) -> Result<Option<StatRow>> {
        self.load_counted(CountedTable::Unit, key).await
    }

    /// Load a unit-item row (verification helper)
    pub async fn load_unit_item(&self, key: &str) -> Result<Option<StatRow>> {
        self.load_counted(CountedTable::UnitItem, key).await
    }

    /// Load an augment row (verification helper)
    pub async fn load_augment(&self, key: &str) -> Result<Option<StatRow>> {
        self.load_counted(CountedTable::Augment, key).await
    }

    /// Load a team row (verification helper)
    pub async fn load_team(&self, key: &str) -> Result<Option<TeamRow>> {
        let row = sqlx::query(
            r#"
            SELECT key, set_number, patch, unit_keys, games, placement_sum, top4, wins
            FROM team_stats
            WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let unit_keys_json: String = row.get("unit_keys");
                Ok(Some(TeamRow {
                    key: row.get("key"),
                    set_number: row.get("set_number"),
                    patch: row.get("patch"),
                    unit_keys: serde_json::from_str(&unit_keys_json)?,
                    games: row.get("games"),
                    placement_sum: row.get("placement_sum"),
                    top4: row.get("top4"),
                    wins: row.get("wins"),
                }))
            }
            None => Ok(None),
        }
    }

    /// Number of matches recorded as processed
    pub async fn count_processed(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processed_matches")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl StatsGateway for SqliteStatsGateway {
    async fn is_processed(&self, match_id: &str) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM processed_matches WHERE match_id = ?")
                .bind(match_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn mark_processed(&self, match_id: &str) -> Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO processed_matches (match_id) VALUES (?)")
            .bind(match_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn upsert_unit(&self, key: &str, character_id: &str, placement: Placement) -> Result<()> {
        self.upsert_counted(CountedTable::Unit, key, character_id, placement)
            .await
    }

    async fn upsert_unit_item(&self, key: &str, unit_key: &str, placement: Placement) -> Result<()> {
        self.upsert_counted(CountedTable::UnitItem, key, unit_key, placement)
            .await
    }

    async fn upsert_augment(&self, key: &str, augment_id: &str, placement: Placement) -> Result<()> {
        self.upsert_counted(CountedTable::Augment, key, augment_id, placement)
            .await
    }

    async fn upsert_team(
        &self,
        key: &str,
        set_number: i64,
        patch: &str,
        unit_keys: &[String],
        placement: Placement,
    ) -> Result<()> {
        validate_placement(placement)?;
        let (top4, win) = finish_flags(placement);
        let unit_keys_json = serde_json::to_string(unit_keys)?;

        sqlx::query(
            r#"
            INSERT INTO team_stats (key, set_number, patch, unit_keys, games, placement_sum, top4, wins)
            VALUES (?, ?, ?, ?, 1, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                games = games + 1,
                placement_sum = placement_sum + excluded.placement_sum,
                top4 = top4 + excluded.top4,
                wins = wins + excluded.wins,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(set_number)
        .bind(patch)
        .bind(unit_keys_json)
        .bind(i64::from(placement))
        .bind(top4)
        .bind(win)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn validate_placement(placement: Placement) -> Result<()> {
    if (1..=8).contains(&placement) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "placement {} outside 1..=8",
            placement
        )))
    }
}

fn finish_flags(placement: Placement) -> (i64, i64) {
    (i64::from(placement <= TOP_FOUR), i64::from(placement == 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    async fn gateway() -> SqliteStatsGateway {
        SqliteStatsGateway::new(init_memory_database().await.unwrap())
    }

    #[tokio::test]
    async fn test_processed_marker_roundtrip() {
        let gw = gateway().await;

        assert!(!gw.is_processed("NA1_1").await.unwrap());
        assert!(gw.mark_processed("NA1_1").await.unwrap());
        assert!(gw.is_processed("NA1_1").await.unwrap());

        // Second mark inserts nothing
        assert!(!gw.mark_processed("NA1_1").await.unwrap());
        assert_eq!(gw.count_processed().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unit_upsert_accumulates() {
        let gw = gateway().await;

        gw.upsert_unit("TFT12_Ashe~12~14.15", "TFT12_Ashe", 1).await.unwrap();
        gw.upsert_unit("TFT12_Ashe~12~14.15", "TFT12_Ashe", 3).await.unwrap();
        gw.upsert_unit("TFT12_Ashe~12~14.15", "TFT12_Ashe", 7).await.unwrap();

        let row = gw.load_unit("TFT12_Ashe~12~14.15").await.unwrap().unwrap();
        assert_eq!(row.subject, "TFT12_Ashe");
        assert_eq!(row.games, 3);
        assert_eq!(row.placement_sum, 11);
        assert_eq!(row.top4, 2);
        assert_eq!(row.wins, 1);
        assert!((row.average_placement().unwrap() - 11.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unit_item_and_augment_tables_are_separate() {
        let gw = gateway().await;

        gw.upsert_unit_item("k~a~b~c", "k", 2).await.unwrap();
        gw.upsert_augment("TFT_Augment_X~12~14.15", "TFT_Augment_X", 5)
            .await
            .unwrap();

        let item = gw.load_unit_item("k~a~b~c").await.unwrap().unwrap();
        assert_eq!(item.subject, "k");
        assert_eq!((item.games, item.top4, item.wins), (1, 1, 0));

        let augment = gw.load_augment("TFT_Augment_X~12~14.15").await.unwrap().unwrap();
        assert_eq!((augment.games, augment.top4), (1, 0));

        assert!(gw.load_unit("k~a~b~c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_team_upsert_stores_unit_keys() {
        let gw = gateway().await;
        let unit_keys = vec!["Ashe~10~14.15".to_string(), "Jinx~10~14.15".to_string()];

        gw.upsert_team("Ashe~Jinx~10~14.15", 10, "14.15", &unit_keys, 4)
            .await
            .unwrap();
        gw.upsert_team("Ashe~Jinx~10~14.15", 10, "14.15", &unit_keys, 1)
            .await
            .unwrap();

        let team = gw.load_team("Ashe~Jinx~10~14.15").await.unwrap().unwrap();
        assert_eq!(team.set_number, 10);
        assert_eq!(team.patch, "14.15");
        assert_eq!(team.unit_keys, unit_keys);
        assert_eq!((team.games, team.placement_sum, team.top4, team.wins), (2, 5, 2, 1));
    }

    #[tokio::test]
    async fn test_out_of_range_placement_rejected() {
        let gw = gateway().await;

        let err = gw.upsert_unit("x~1~1.1", "x", 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        let err = gw.upsert_augment("x~1~1.1", "x", 9).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}

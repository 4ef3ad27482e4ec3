use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use questlist_domain::shared::{DomainError, UserId};
use questlist_domain::stats::{StatsRecord, StatsRepository};

use crate::persistence::SqliteRepositoryBase;

#[derive(FromRow)]
struct StatsRow {
    user_id: String,
    user_name: String,
    points: i64,
    level: i64,
    xp: i64,
    coins: i64,
    last_claimed_daily: Option<DateTime<Utc>>,
    equipped_theme: String,
    unlocked_themes: String,
}

impl StatsRow {
    fn into_record(self) -> StatsRecord {
        StatsRecord::restore(
            UserId::from_string(&self.user_id),
            self.user_name,
            self.points,
            self.level,
            self.xp,
            self.coins,
            self.last_claimed_daily,
            self.equipped_theme,
            split_themes(&self.unlocked_themes),
        )
    }
}

fn split_themes(column: &str) -> Vec<String> {
    column
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn join_themes(themes: &[String]) -> String {
    themes.join(",")
}

const SELECT_COLUMNS: &str = "user_id, user_name, points, level, xp, coins, \
     last_claimed_daily, equipped_theme, unlocked_themes";

/// SQLite-backed stats store. Each mutation refreshes the watch channels
/// so observers see the freshly committed record, not the value that was
/// in memory when the write started.
pub struct SqliteStatsRepository {
    base: SqliteRepositoryBase,
    user_channels: RwLock<HashMap<String, watch::Sender<Option<StatsRecord>>>>,
    all_channel: watch::Sender<Vec<StatsRecord>>,
}

impl SqliteStatsRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        let (all_channel, _) = watch::channel(Vec::new());
        Self {
            base: SqliteRepositoryBase::new(pool),
            user_channels: RwLock::new(HashMap::new()),
            all_channel,
        }
    }

    async fn load(&self, user_id: &UserId) -> Result<Option<StatsRecord>, DomainError> {
        let query = format!("SELECT {} FROM stats WHERE user_id = ?1", SELECT_COLUMNS);
        let row: Option<StatsRow> = self
            .base
            .fetch_optional(
                sqlx::query_as(&query).bind(user_id.as_str()),
                "Find stats by user ID",
            )
            .await?;
        Ok(row.map(|r| r.into_record()))
    }

    async fn load_all(&self) -> Result<Vec<StatsRecord>, DomainError> {
        let query = format!("SELECT {} FROM stats", SELECT_COLUMNS);
        let rows: Vec<StatsRow> = self
            .base
            .fetch_all(sqlx::query_as(&query), "Find all stats")
            .await?;
        Ok(rows.into_iter().map(|r| r.into_record()).collect())
    }

    async fn upsert_row(&self, stats: &StatsRecord) -> Result<(), DomainError> {
        let query = r#"
            INSERT INTO stats (user_id, user_name, points, level, xp, coins,
                               last_claimed_daily, equipped_theme, unlocked_themes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(user_id) DO UPDATE SET
                user_name = ?2,
                points = ?3,
                level = ?4,
                xp = ?5,
                coins = ?6,
                last_claimed_daily = ?7,
                equipped_theme = ?8,
                unlocked_themes = ?9
        "#;

        self.base
            .execute(
                sqlx::query(query)
                    .bind(stats.user_id().as_str())
                    .bind(stats.user_name())
                    .bind(stats.points())
                    .bind(stats.level())
                    .bind(stats.xp())
                    .bind(stats.coins())
                    .bind(stats.last_claimed_daily())
                    .bind(stats.equipped_theme())
                    .bind(join_themes(stats.unlocked_themes())),
                "Upsert stats",
            )
            .await?;
        Ok(())
    }

    /// Push the committed state to every interested observer.
    async fn notify(&self, user_id: &UserId) -> Result<(), DomainError> {
        let record = self.load(user_id).await?;
        {
            let channels = self.user_channels.read().await;
            if let Some(sender) = channels.get(user_id.as_str()) {
                sender.send_replace(record);
            }
        }
        self.all_channel.send_replace(self.load_all().await?);
        Ok(())
    }
}

#[async_trait]
impl StatsRepository for SqliteStatsRepository {
    async fn observe(
        &self,
        user_id: &UserId,
    ) -> Result<watch::Receiver<Option<StatsRecord>>, DomainError> {
        let mut channels = self.user_channels.write().await;
        if let Some(sender) = channels.get(user_id.as_str()) {
            return Ok(sender.subscribe());
        }

        let snapshot = self.load(user_id).await?;
        let (sender, receiver) = watch::channel(snapshot);
        channels.insert(user_id.as_str().to_string(), sender);
        Ok(receiver)
    }

    async fn observe_all(&self) -> Result<watch::Receiver<Vec<StatsRecord>>, DomainError> {
        self.all_channel.send_replace(self.load_all().await?);
        Ok(self.all_channel.subscribe())
    }

    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<StatsRecord>, DomainError> {
        self.load(user_id).await
    }

    async fn find_all(&self) -> Result<Vec<StatsRecord>, DomainError> {
        self.load_all().await
    }

    async fn save(&self, stats: &StatsRecord) -> Result<(), DomainError> {
        self.upsert_row(stats).await?;
        self.notify(stats.user_id()).await
    }

    async fn upsert_many(&self, records: &[StatsRecord]) -> Result<(), DomainError> {
        for record in records {
            self.upsert_row(record).await?;
        }
        // One bulk refresh instead of per-record notifications.
        {
            let channels = self.user_channels.read().await;
            for record in records {
                if let Some(sender) = channels.get(record.user_id().as_str()) {
                    sender.send_replace(Some(record.clone()));
                }
            }
        }
        self.all_channel.send_replace(self.load_all().await?);
        Ok(())
    }
}

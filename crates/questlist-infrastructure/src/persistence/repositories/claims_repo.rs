use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use questlist_domain::challenge::{ClaimRecord, ClaimsRepository};
use questlist_domain::shared::{DomainError, UserId};

use crate::persistence::SqliteRepositoryBase;

#[derive(FromRow)]
struct ClaimRow {
    challenge_id: String,
    claimed_at: DateTime<Utc>,
    credited: bool,
}

impl ClaimRow {
    fn into_record(self) -> ClaimRecord {
        ClaimRecord {
            challenge_id: self.challenge_id,
            claimed_at: self.claimed_at,
            credited: self.credited,
        }
    }
}

/// SQLite-backed claims ledger. Inserts are write-once: re-claiming an id
/// is reported as `false`, never as an error.
pub struct SqliteClaimsRepository {
    base: SqliteRepositoryBase,
    user_channels: RwLock<HashMap<String, watch::Sender<BTreeSet<String>>>>,
}

impl SqliteClaimsRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
            user_channels: RwLock::new(HashMap::new()),
        }
    }

    async fn load_ids(&self, user_id: &UserId) -> Result<BTreeSet<String>, DomainError> {
        let rows: Vec<(String,)> = self
            .base
            .fetch_all(
                sqlx::query_as(
                    "SELECT challenge_id FROM claimed_challenges WHERE user_id = ?1",
                )
                .bind(user_id.as_str()),
                "Find claimed challenge IDs",
            )
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn notify(&self, user_id: &UserId) -> Result<(), DomainError> {
        let channels = self.user_channels.read().await;
        if let Some(sender) = channels.get(user_id.as_str()) {
            sender.send_replace(self.load_ids(user_id).await?);
        }
        Ok(())
    }
}

#[async_trait]
impl ClaimsRepository for SqliteClaimsRepository {
    async fn observe_all(
        &self,
        user_id: &UserId,
    ) -> Result<watch::Receiver<BTreeSet<String>>, DomainError> {
        let mut channels = self.user_channels.write().await;
        if let Some(sender) = channels.get(user_id.as_str()) {
            return Ok(sender.subscribe());
        }

        let snapshot = self.load_ids(user_id).await?;
        let (sender, receiver) = watch::channel(snapshot);
        channels.insert(user_id.as_str().to_string(), sender);
        Ok(receiver)
    }

    async fn claimed_ids(&self, user_id: &UserId) -> Result<BTreeSet<String>, DomainError> {
        self.load_ids(user_id).await
    }

    async fn record_claim(
        &self,
        user_id: &UserId,
        challenge_id: &str,
    ) -> Result<bool, DomainError> {
        let result = self
            .base
            .execute(
                sqlx::query(
                    "INSERT OR IGNORE INTO claimed_challenges \
                     (user_id, challenge_id, claimed_at, credited) VALUES (?1, ?2, ?3, 0)",
                )
                .bind(user_id.as_str())
                .bind(challenge_id)
                .bind(Utc::now()),
                "Record challenge claim",
            )
            .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            self.notify(user_id).await?;
        }
        Ok(inserted)
    }

    async fn mark_credited(
        &self,
        user_id: &UserId,
        challenge_id: &str,
    ) -> Result<(), DomainError> {
        self.base
            .execute(
                sqlx::query(
                    "UPDATE claimed_challenges SET credited = 1 \
                     WHERE user_id = ?1 AND challenge_id = ?2",
                )
                .bind(user_id.as_str())
                .bind(challenge_id),
                "Mark claim credited",
            )
            .await?;
        Ok(())
    }

    async fn find_uncredited(&self, user_id: &UserId) -> Result<Vec<ClaimRecord>, DomainError> {
        let rows: Vec<ClaimRow> = self
            .base
            .fetch_all(
                sqlx::query_as(
                    "SELECT challenge_id, claimed_at, credited FROM claimed_challenges \
                     WHERE user_id = ?1 AND credited = 0 ORDER BY claimed_at ASC",
                )
                .bind(user_id.as_str()),
                "Find uncredited claims",
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.into_record()).collect())
    }
}

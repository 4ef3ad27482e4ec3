use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

use questlist_domain::shared::{DomainError, UserId};
use questlist_domain::stats::{RemoteStatsGateway, StatsRecord, StatsRepository};

use super::SqliteStatsRepository;

/// Stats store that keeps the local cache authoritative for reads and
/// mirrors every write to the remote document store, best-effort.
/// A remote failure degrades to local-only with a warning; the next
/// successful write overwrites the stale remote copy (last-write-wins).
pub struct SyncingStatsRepository {
    local: Arc<SqliteStatsRepository>,
    remote: Arc<dyn RemoteStatsGateway>,
}

impl SyncingStatsRepository {
    pub fn new(local: Arc<SqliteStatsRepository>, remote: Arc<dyn RemoteStatsGateway>) -> Self {
        Self { local, remote }
    }
}

#[async_trait]
impl StatsRepository for SyncingStatsRepository {
    async fn observe(
        &self,
        user_id: &UserId,
    ) -> Result<watch::Receiver<Option<StatsRecord>>, DomainError> {
        self.local.observe(user_id).await
    }

    async fn observe_all(&self) -> Result<watch::Receiver<Vec<StatsRecord>>, DomainError> {
        self.local.observe_all().await
    }

    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<StatsRecord>, DomainError> {
        self.local.find_by_user_id(user_id).await
    }

    async fn find_all(&self) -> Result<Vec<StatsRecord>, DomainError> {
        self.local.find_all().await
    }

    async fn save(&self, stats: &StatsRecord) -> Result<(), DomainError> {
        self.local.save(stats).await?;

        if let Err(e) = self.remote.upsert(stats).await {
            tracing::warn!(
                user_id = %stats.user_id(),
                error = %e,
                "Remote stats upsert failed, continuing local-only"
            );
        }
        Ok(())
    }

    async fn upsert_many(&self, records: &[StatsRecord]) -> Result<(), DomainError> {
        // Bulk upserts come from remote syncs; no mirror-back needed.
        self.local.upsert_many(records).await
    }

    async fn hydrate(&self, user_id: &UserId) -> Result<(), DomainError> {
        match self.remote.fetch(user_id).await {
            Ok(Some(remote_record)) => self.local.save(&remote_record).await,
            Ok(None) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Remote stats fetch failed, keeping cached record"
                );
                Ok(())
            }
        }
    }
}

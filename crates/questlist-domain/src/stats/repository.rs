use async_trait::async_trait;
use tokio::sync::watch;

use super::StatsRecord;
use crate::shared::{DomainError, UserId};

/// Stats record store boundary (the local cache side). Writes are
/// last-write-wins full-record upserts; observation is push-based.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Live stream of one user's record. The receiver's current value is
    /// the latest snapshot; re-subscribing yields a fresh snapshot then
    /// deltas.
    async fn observe(
        &self,
        user_id: &UserId,
    ) -> Result<watch::Receiver<Option<StatsRecord>>, DomainError>;

    /// Live stream of every cached record, for the leaderboard projection.
    async fn observe_all(&self) -> Result<watch::Receiver<Vec<StatsRecord>>, DomainError>;

    async fn find_by_user_id(&self, user_id: &UserId)
        -> Result<Option<StatsRecord>, DomainError>;

    async fn find_all(&self) -> Result<Vec<StatsRecord>, DomainError>;

    /// Full-record replace (insert or overwrite).
    async fn save(&self, stats: &StatsRecord) -> Result<(), DomainError>;

    /// Bulk upsert, used when syncing a remote snapshot into the cache.
    async fn upsert_many(&self, records: &[StatsRecord]) -> Result<(), DomainError>;

    /// Pull the freshest remote copy of this user's record into the local
    /// cache, best-effort. Local-only implementations keep the default
    /// no-op.
    async fn hydrate(&self, _user_id: &UserId) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Remote document-store boundary. All calls are best-effort overlays on
/// the authoritative-enough local cache: failures degrade to local-only
/// and must never block reads.
#[async_trait]
pub trait RemoteStatsGateway: Send + Sync {
    async fn fetch(&self, user_id: &UserId) -> Result<Option<StatsRecord>, DomainError>;

    async fn upsert(&self, stats: &StatsRecord) -> Result<(), DomainError>;

    /// Top records sorted by level then points, both descending.
    async fn fetch_top(&self, limit: usize) -> Result<Vec<StatsRecord>, DomainError>;
}

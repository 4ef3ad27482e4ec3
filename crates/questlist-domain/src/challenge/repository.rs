use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio::sync::watch;

use crate::shared::{DomainError, UserId};

/// One row per `(user, challenge)` once claimed. The ledger insert is the
/// durability boundary for claiming: `credited` flips to true only after
/// the coin credit has been persisted, so an interrupted claim is settled
/// on the next challenge load instead of being lost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub challenge_id: String,
    pub claimed_at: DateTime<Utc>,
    pub credited: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("Challenge not eligible for claiming: {0}")]
    NotEligible(String),

    #[error(transparent)]
    Store(#[from] DomainError),
}

/// Claims ledger boundary.
#[async_trait]
pub trait ClaimsRepository: Send + Sync {
    /// Live stream of the user's claimed challenge id set.
    async fn observe_all(
        &self,
        user_id: &UserId,
    ) -> Result<watch::Receiver<BTreeSet<String>>, DomainError>;

    async fn claimed_ids(&self, user_id: &UserId) -> Result<BTreeSet<String>, DomainError>;

    /// Write-once insert. Returns `false` (without error) when the claim
    /// already exists, making double-claims a no-op at the store level.
    async fn record_claim(
        &self,
        user_id: &UserId,
        challenge_id: &str,
    ) -> Result<bool, DomainError>;

    /// Mark a claim's reward as credited to the stats record.
    async fn mark_credited(&self, user_id: &UserId, challenge_id: &str)
        -> Result<(), DomainError>;

    /// Claims whose reward credit was never observed (crash between the
    /// ledger write and the stats write).
    async fn find_uncredited(&self, user_id: &UserId) -> Result<Vec<ClaimRecord>, DomainError>;
}

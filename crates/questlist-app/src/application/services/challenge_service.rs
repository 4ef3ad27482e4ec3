use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use questlist_domain::challenge::{
    find_challenge, ChallengeDefinition, ClaimError, ClaimsRepository,
};
use questlist_domain::events::{ChallengeClaimed, EventBus};
use questlist_domain::progression::{ChallengeProgress, ProgressionDomainService};
use questlist_domain::shared::{DomainError, UserId};
use questlist_domain::stats::StatsRepository;
use questlist_domain::task::{TaskRecord, TaskRepository};

use crate::application::dtos::ChallengeView;
use crate::application::services::{load_stats_or_default, publish_or_warn};

/// Live challenge projection for one user. Dropping the feed aborts the
/// background combiner task.
pub struct ChallengeFeed {
    receiver: watch::Receiver<Vec<ChallengeView>>,
    handle: JoinHandle<()>,
}

impl ChallengeFeed {
    pub fn receiver(&self) -> watch::Receiver<Vec<ChallengeView>> {
        self.receiver.clone()
    }
}

impl Drop for ChallengeFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Challenge progress and claiming. Progress is never persisted: it is
/// re-derived from the task snapshot and the claims ledger on every
/// emission of either input.
pub struct ChallengeService {
    task_repo: Arc<dyn TaskRepository>,
    claims_repo: Arc<dyn ClaimsRepository>,
    stats_repo: Arc<dyn StatsRepository>,
    event_bus: Arc<dyn EventBus>,
}

impl ChallengeService {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        claims_repo: Arc<dyn ClaimsRepository>,
        stats_repo: Arc<dyn StatsRepository>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            task_repo,
            claims_repo,
            stats_repo,
            event_bus,
        }
    }

    fn project(tasks: &[TaskRecord], claimed_ids: &BTreeSet<String>) -> Vec<ChallengeView> {
        ProgressionDomainService::compute_progress(tasks, claimed_ids)
            .iter()
            .map(ChallengeView::from)
            .collect()
    }

    /// One-shot snapshot of every challenge's state for this user.
    pub async fn challenge_views(&self, user_id: &UserId) -> Result<Vec<ChallengeView>, DomainError> {
        let tasks = self.task_repo.find_by_owner(user_id).await?;
        let claimed_ids = self.claims_repo.claimed_ids(user_id).await?;
        Ok(Self::project(&tasks, &claimed_ids))
    }

    /// Start the live challenge feed. Settles any claimed-but-uncredited
    /// ledger rows first, then combines the task and claims streams into
    /// one view stream.
    pub async fn observe_challenges(&self, user_id: &UserId) -> Result<ChallengeFeed, DomainError> {
        self.settle_uncredited(user_id).await?;

        let mut task_rx = self.task_repo.observe(user_id).await?;
        let mut claims_rx = self.claims_repo.observe_all(user_id).await?;

        let initial = {
            let tasks = task_rx.borrow_and_update().clone();
            let claimed_ids = claims_rx.borrow_and_update().clone();
            Self::project(&tasks, &claimed_ids)
        };
        let (tx, rx) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            loop {
                let changed = tokio::select! {
                    changed = task_rx.changed() => changed,
                    changed = claims_rx.changed() => changed,
                };
                if changed.is_err() {
                    break;
                }
                let tasks = task_rx.borrow_and_update().clone();
                let claimed_ids = claims_rx.borrow_and_update().clone();
                tx.send_replace(Self::project(&tasks, &claimed_ids));
            }
        });

        Ok(ChallengeFeed {
            receiver: rx,
            handle,
        })
    }

    /// Claim a completed challenge. The ledger insert comes first and is
    /// write-once, so concurrent or repeated claims of the same challenge
    /// credit at most once; an ineligible claim surfaces as
    /// `ClaimError::NotEligible`.
    pub async fn claim_challenge(
        &self,
        user_id: &UserId,
        challenge_id: &str,
    ) -> Result<i64, ClaimError> {
        let definition = find_challenge(challenge_id)
            .ok_or_else(|| ClaimError::NotEligible(format!("Unknown challenge: {}", challenge_id)))?;

        let tasks = self.task_repo.find_by_owner(user_id).await?;
        let claimed_ids = self.claims_repo.claimed_ids(user_id).await?;
        let progress = ChallengeProgress {
            definition,
            current: ProgressionDomainService::progress_for(definition, &tasks),
            claimed: claimed_ids.contains(challenge_id),
        };
        ProgressionDomainService::can_claim(&progress)?;

        let inserted = self.claims_repo.record_claim(user_id, challenge_id).await?;
        if !inserted {
            // Lost the race against a concurrent claim of the same id.
            return Err(ClaimError::NotEligible(format!(
                "Challenge already claimed: {}",
                challenge_id
            )));
        }

        self.credit_claim(user_id, definition).await?;
        Ok(definition.coin_reward)
    }

    /// Credit ledger rows whose coin grant never landed (interrupted
    /// between the ledger write and the stats write). Each row is credited
    /// exactly once. Returns the number of rows settled.
    pub async fn settle_uncredited(&self, user_id: &UserId) -> Result<usize, DomainError> {
        let pending = self.claims_repo.find_uncredited(user_id).await?;
        for claim in &pending {
            match find_challenge(&claim.challenge_id) {
                Some(definition) => self.credit_claim(user_id, definition).await?,
                None => {
                    // Definition retired since the claim; close the row so
                    // it stops showing up as pending.
                    tracing::warn!("Dropping claim for retired challenge {}", claim.challenge_id);
                    self.claims_repo
                        .mark_credited(user_id, &claim.challenge_id)
                        .await?;
                }
            }
        }
        Ok(pending.len())
    }

    async fn credit_claim(
        &self,
        user_id: &UserId,
        definition: &'static ChallengeDefinition,
    ) -> Result<(), DomainError> {
        let mut stats = load_stats_or_default(&self.stats_repo, user_id).await?;
        stats.credit_coins(definition.coin_reward);
        self.stats_repo.save(&stats).await?;
        self.claims_repo.mark_credited(user_id, definition.id).await?;

        publish_or_warn(
            &self.event_bus,
            Box::new(ChallengeClaimed {
                user_id: user_id.clone(),
                challenge_id: definition.id.to_string(),
                coins: definition.coin_reward,
                occurred_at: Utc::now(),
            }),
        )
        .await;
        Ok(())
    }
}

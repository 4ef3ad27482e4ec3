//! Built-in event consumers wired at bootstrap. A UI embedding the
//! engine subscribes its own handlers next to these.

use async_trait::async_trait;

use questlist_domain::events::{ChallengeClaimed, DailyRewardGranted, EventHandler, XpAwarded};
use questlist_domain::shared::DomainError;

/// Writes every reward event to the structured log, so a session's
/// reward history is reconstructable from the log files alone.
pub struct RewardAuditHandler;

#[async_trait]
impl EventHandler<XpAwarded> for RewardAuditHandler {
    async fn handle(&self, event: &XpAwarded) -> Result<(), DomainError> {
        if event.leveled_up() {
            tracing::info!(
                user_id = %event.user_id,
                xp = event.xp,
                new_level = event.new_level,
                "XP awarded, level up"
            );
        } else {
            tracing::info!(user_id = %event.user_id, xp = event.xp, "XP awarded");
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler<DailyRewardGranted> for RewardAuditHandler {
    async fn handle(&self, event: &DailyRewardGranted) -> Result<(), DomainError> {
        tracing::info!(
            user_id = %event.user_id,
            points = event.points,
            "Daily reward granted"
        );
        Ok(())
    }
}

#[async_trait]
impl EventHandler<ChallengeClaimed> for RewardAuditHandler {
    async fn handle(&self, event: &ChallengeClaimed) -> Result<(), DomainError> {
        tracing::info!(
            user_id = %event.user_id,
            challenge_id = %event.challenge_id,
            coins = event.coins,
            "Challenge reward claimed"
        );
        Ok(())
    }
}

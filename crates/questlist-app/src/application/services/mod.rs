use std::sync::Arc;

use questlist_domain::events::{DomainEvent, EventBus};
use questlist_domain::shared::{DomainError, UserId};
use questlist_domain::stats::{StatsRecord, StatsRepository};

mod challenge_service;
mod leaderboard_service;
mod profile_service;
mod progression_service;
mod shop_service;

#[cfg(test)]
mod tests;

pub use challenge_service::{ChallengeFeed, ChallengeService};
pub use leaderboard_service::{LeaderboardFeed, LeaderboardService};
pub use profile_service::ProfileService;
pub use progression_service::ProgressionService;
pub use shop_service::ShopService;

/// Load a user's stats record, synthesizing the default record when the
/// store has none. An authenticated user id never surfaces a not-found
/// error from the engine.
pub(crate) async fn load_stats_or_default(
    stats_repo: &Arc<dyn StatsRepository>,
    user_id: &UserId,
) -> Result<StatsRecord, DomainError> {
    Ok(stats_repo
        .find_by_user_id(user_id)
        .await?
        .unwrap_or_else(|| StatsRecord::new(user_id.clone(), String::new())))
}

/// Reward notifications are fire-and-forget: a failed handler never fails
/// the operation that produced the event.
pub(crate) async fn publish_or_warn(event_bus: &Arc<dyn EventBus>, event: Box<dyn DomainEvent>) {
    let event_type = event.event_type_name();
    if let Err(e) = event_bus.publish(event).await {
        tracing::warn!("Failed to publish {}: {}", event_type, e);
    }
}

use std::sync::Arc;

use tokio::sync::watch;

use questlist_domain::rewards::LevelCurve;
use questlist_domain::shared::{DomainError, UserId};
use questlist_domain::stats::{StatsRecord, StatsRepository};
use questlist_domain::task::TaskRepository;

use crate::application::dtos::ProfileSummaryDto;
use crate::application::queries::profile_queries;
use crate::application::services::load_stats_or_default;

/// Stats record lifecycle and the profile screen's read model.
pub struct ProfileService {
    stats_repo: Arc<dyn StatsRepository>,
    task_repo: Arc<dyn TaskRepository>,
    curve: LevelCurve,
}

impl ProfileService {
    pub fn new(
        stats_repo: Arc<dyn StatsRepository>,
        task_repo: Arc<dyn TaskRepository>,
        curve: LevelCurve,
    ) -> Self {
        Self {
            stats_repo,
            task_repo,
            curve,
        }
    }

    /// Login entry point: pull the freshest remote copy into the cache
    /// (best-effort), create the default record if none exists, and
    /// backfill a blank display name from the auth profile.
    pub async fn ensure_stats(
        &self,
        user_id: &UserId,
        display_name: &str,
    ) -> Result<StatsRecord, DomainError> {
        if let Err(e) = self.stats_repo.hydrate(user_id).await {
            tracing::warn!("Stats hydration failed, using local cache: {}", e);
        }

        match self.stats_repo.find_by_user_id(user_id).await? {
            Some(mut stats) => {
                if stats.user_name().trim().is_empty() && !display_name.trim().is_empty() {
                    stats.rename(display_name.to_string())?;
                    self.stats_repo.save(&stats).await?;
                }
                Ok(stats)
            }
            None => {
                let stats = StatsRecord::new(user_id.clone(), display_name.trim().to_string());
                self.stats_repo.save(&stats).await?;
                Ok(stats)
            }
        }
    }

    pub async fn rename(&self, user_id: &UserId, display_name: &str) -> Result<(), DomainError> {
        let mut stats = load_stats_or_default(&self.stats_repo, user_id).await?;
        stats.rename(display_name.to_string())?;
        self.stats_repo.save(&stats).await
    }

    /// Live stream of this user's stats record.
    pub async fn observe_stats(
        &self,
        user_id: &UserId,
    ) -> Result<watch::Receiver<Option<StatsRecord>>, DomainError> {
        self.stats_repo.observe(user_id).await
    }

    /// Aggregated profile card: progression stats plus the task-history
    /// projections.
    pub async fn summary(&self, user_id: &UserId) -> Result<ProfileSummaryDto, DomainError> {
        let stats = load_stats_or_default(&self.stats_repo, user_id).await?;
        let tasks = self.task_repo.find_by_owner(user_id).await?;

        Ok(ProfileSummaryDto {
            user_id: stats.user_id().as_str().to_string(),
            display_name: stats.display_name().to_string(),
            level: stats.level(),
            xp: stats.xp(),
            xp_for_next_level: self.curve.xp_for_next_level(stats.level()),
            points: stats.points(),
            coins: stats.coins(),
            equipped_theme: stats.equipped_theme().to_string(),
            unlocked_themes: stats.unlocked_themes().to_vec(),
            completed_tasks: profile_queries::completed_count(&tasks),
            pending_tasks: profile_queries::pending_count(&tasks),
            favorite_category: profile_queries::favorite_category(&tasks),
            completions_by_weekday: profile_queries::completions_by_weekday(&tasks),
        })
    }
}

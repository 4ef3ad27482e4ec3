use std::sync::Arc;

use chrono::{DateTime, Utc};

use questlist_domain::events::{DailyRewardGranted, EventBus, XpAwarded};
use questlist_domain::rewards::{xp_for_difficulty, LevelCurve, DAILY_REWARD_POINTS};
use questlist_domain::shared::{DomainError, TaskId, UserId};
use questlist_domain::stats::StatsRepository;
use questlist_domain::task::{Difficulty, TaskRecord, TaskRepository};

use crate::application::dtos::TaskToggleDto;
use crate::application::services::{load_stats_or_default, publish_or_warn};

/// Task lifecycle plus the XP/points engine behind it. Completing a task
/// credits its difficulty yield; un-completing reverts the same yield, so
/// toggling a task off and back on nets exactly one completion's reward.
pub struct ProgressionService {
    task_repo: Arc<dyn TaskRepository>,
    stats_repo: Arc<dyn StatsRepository>,
    event_bus: Arc<dyn EventBus>,
    curve: LevelCurve,
}

impl ProgressionService {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        stats_repo: Arc<dyn StatsRepository>,
        event_bus: Arc<dyn EventBus>,
        curve: LevelCurve,
    ) -> Self {
        Self {
            task_repo,
            stats_repo,
            event_bus,
            curve,
        }
    }

    pub async fn create_task(
        &self,
        owner_id: &UserId,
        title: String,
        description: Option<String>,
        category: String,
        difficulty: Difficulty,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<TaskRecord, DomainError> {
        let task = TaskRecord::new(
            owner_id.clone(),
            title,
            description,
            category,
            difficulty,
            due_date,
        )?;
        self.task_repo.insert(&task).await?;
        Ok(task)
    }

    /// Delete a task without touching the stats record. Challenge progress
    /// is derived live from the task store, so it drops on its own.
    pub async fn delete_task(&self, task_id: &TaskId) -> Result<(), DomainError> {
        self.task_repo.delete(task_id).await
    }

    /// Flip a task's completion state and move the owner's stats with it.
    /// Incomplete -> complete credits the difficulty yield to xp and
    /// points (multi-level carry); complete -> incomplete reverts it
    /// symmetrically, flooring at level 1 / xp 0 / points 0.
    pub async fn toggle_task_completion(
        &self,
        task_id: &TaskId,
    ) -> Result<TaskToggleDto, DomainError> {
        let mut task = self
            .task_repo
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Task not found: {}", task_id)))?;

        let now_completed = task.toggle_completed();
        self.task_repo.update(&task).await?;

        let amount = xp_for_difficulty(task.difficulty());
        let mut stats = load_stats_or_default(&self.stats_repo, task.owner_id()).await?;
        let change = if now_completed {
            stats.award_xp(amount, self.curve)
        } else {
            stats.revert_xp(amount, self.curve)
        };
        self.stats_repo.save(&stats).await?;

        if now_completed {
            publish_or_warn(
                &self.event_bus,
                Box::new(XpAwarded {
                    user_id: task.owner_id().clone(),
                    xp: amount,
                    previous_level: change.previous_level,
                    new_level: change.new_level,
                    occurred_at: Utc::now(),
                }),
            )
            .await;
        }

        Ok(TaskToggleDto::from_change(
            task.id().as_str().to_string(),
            now_completed,
            change,
        ))
    }

    /// Lazy daily reward check, meant to run on login/app start. Returns
    /// the points granted, or `None` inside the 24h cooldown.
    pub async fn check_daily_reward(&self, user_id: &UserId) -> Result<Option<i64>, DomainError> {
        // Evaluate against a fresh read of the committed record; acting on
        // a stale stream emission could grant twice.
        let mut stats = load_stats_or_default(&self.stats_repo, user_id).await?;
        let now = Utc::now();

        if !stats.is_daily_reward_due(now) {
            return Ok(None);
        }

        stats.claim_daily_reward(DAILY_REWARD_POINTS, now);
        self.stats_repo.save(&stats).await?;

        publish_or_warn(
            &self.event_bus,
            Box::new(DailyRewardGranted {
                user_id: user_id.clone(),
                points: DAILY_REWARD_POINTS,
                occurred_at: now,
            }),
        )
        .await;

        Ok(Some(DAILY_REWARD_POINTS))
    }
}

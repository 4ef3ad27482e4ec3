use serde::{Deserialize, Serialize};

use questlist_domain::progression::ChallengeProgress;
use questlist_domain::rewards::ShopItem;
use questlist_domain::stats::{LevelChange, StatsRecord};

/// One challenge as shown to the user: static definition plus the
/// progress derived from the live task and claim snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub coin_reward: i64,
    pub current: i64,
    pub target: i64,
    pub claimed: bool,
    pub completed: bool,
}

impl From<&ChallengeProgress> for ChallengeView {
    fn from(p: &ChallengeProgress) -> Self {
        Self {
            id: p.definition.id.to_string(),
            title: p.definition.title.to_string(),
            description: p.definition.description.to_string(),
            coin_reward: p.definition.coin_reward,
            current: p.current.min(p.definition.target_progress),
            target: p.definition.target_progress,
            claimed: p.claimed,
            completed: p.is_complete(),
        }
    }
}

/// Outcome of toggling a task's completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskToggleDto {
    pub task_id: String,
    pub completed: bool,
    pub xp_delta: i64,
    pub previous_level: i64,
    pub new_level: i64,
}

impl TaskToggleDto {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.previous_level
    }

    pub(crate) fn from_change(task_id: String, completed: bool, change: LevelChange) -> Self {
        Self {
            task_id,
            completed,
            xp_delta: change.xp_delta,
            previous_level: change.previous_level,
            new_level: change.new_level,
        }
    }
}

/// One leaderboard row, rank already assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntryDto {
    pub rank: usize,
    pub user_id: String,
    pub display_name: String,
    pub level: i64,
    pub points: i64,
    pub equipped_theme: String,
}

impl LeaderboardEntryDto {
    pub(crate) fn from_record(rank: usize, record: &StatsRecord) -> Self {
        Self {
            rank,
            user_id: record.user_id().as_str().to_string(),
            display_name: record.display_name().to_string(),
            level: record.level(),
            points: record.points(),
            equipped_theme: record.equipped_theme().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopItemDto {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub owned: bool,
    pub affordable: bool,
}

impl ShopItemDto {
    pub(crate) fn from_item(item: &ShopItem, stats: &StatsRecord) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.to_string(),
            price: item.price,
            owned: stats.owns_theme(item.id),
            affordable: stats.can_afford(item.price),
        }
    }
}

/// Aggregated profile card: progression stats plus task history numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummaryDto {
    pub user_id: String,
    pub display_name: String,
    pub level: i64,
    pub xp: i64,
    pub xp_for_next_level: i64,
    pub points: i64,
    pub coins: i64,
    pub equipped_theme: String,
    pub unlocked_themes: Vec<String>,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub favorite_category: Option<String>,
    /// Completed-task counts indexed Monday..Sunday.
    pub completions_by_weekday: [usize; 7],
}

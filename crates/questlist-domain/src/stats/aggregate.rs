use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::rewards::{LevelCurve, DAILY_REWARD_COOLDOWN_HOURS};
use crate::shared::{DomainError, UserId};

/// Theme every user owns implicitly.
pub const DEFAULT_THEME: &str = "default";

/// Outcome of applying an XP delta to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChange {
    pub xp_delta: i64,
    pub previous_level: i64,
    pub new_level: i64,
}

impl LevelChange {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.previous_level
    }
}

/// One progression record per user: score, level, XP remainder, spendable
/// coins, daily-claim stamp and unlocked cosmetics. Persisted with
/// last-write-wins upserts in both the local cache and the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsRecord {
    user_id: UserId,
    user_name: String,
    points: i64,
    level: i64,
    xp: i64,
    coins: i64,
    last_claimed_daily: Option<DateTime<Utc>>,
    equipped_theme: String,
    unlocked_themes: Vec<String>,
}

impl StatsRecord {
    pub fn new(user_id: UserId, user_name: String) -> Self {
        Self {
            user_id,
            user_name,
            points: 0,
            level: 1,
            xp: 0,
            coins: 0,
            last_claimed_daily: None,
            equipped_theme: DEFAULT_THEME.to_string(),
            unlocked_themes: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        user_id: UserId,
        user_name: String,
        points: i64,
        level: i64,
        xp: i64,
        coins: i64,
        last_claimed_daily: Option<DateTime<Utc>>,
        equipped_theme: String,
        unlocked_themes: Vec<String>,
    ) -> Self {
        Self {
            user_id,
            user_name,
            points,
            level: level.max(1),
            xp: xp.max(0),
            coins: coins.max(0),
            last_claimed_daily,
            equipped_theme,
            unlocked_themes,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Display name with the anonymous fallback applied.
    pub fn display_name(&self) -> &str {
        if self.user_name.trim().is_empty() {
            "Player"
        } else {
            &self.user_name
        }
    }

    pub fn points(&self) -> i64 {
        self.points
    }

    pub fn level(&self) -> i64 {
        self.level
    }

    pub fn xp(&self) -> i64 {
        self.xp
    }

    pub fn coins(&self) -> i64 {
        self.coins
    }

    pub fn last_claimed_daily(&self) -> Option<DateTime<Utc>> {
        self.last_claimed_daily
    }

    pub fn equipped_theme(&self) -> &str {
        &self.equipped_theme
    }

    pub fn unlocked_themes(&self) -> &[String] {
        &self.unlocked_themes
    }

    pub fn rename(&mut self, user_name: String) -> Result<(), DomainError> {
        if user_name.trim().is_empty() {
            return Err(DomainError::Validation(
                "Display name cannot be empty".to_string(),
            ));
        }
        self.user_name = user_name.trim().to_string();
        Ok(())
    }

    /// Credit completion XP: adds `amount` to both xp and points, then
    /// normalizes the remainder against the curve. Supports multi-level
    /// jumps from a single award.
    pub fn award_xp(&mut self, amount: i64, curve: LevelCurve) -> LevelChange {
        let previous_level = self.level;
        self.xp += amount;
        self.points += amount;

        while self.xp >= curve.xp_for_next_level(self.level) {
            self.xp -= curve.xp_for_next_level(self.level);
            self.level += 1;
        }

        LevelChange {
            xp_delta: amount,
            previous_level,
            new_level: self.level,
        }
    }

    /// Inverse of `award_xp`, used when a task is un-completed so that
    /// toggling cannot farm rewards. Borrows levels back down as needed
    /// and floors at level 1 / xp 0 / points 0.
    pub fn revert_xp(&mut self, amount: i64, curve: LevelCurve) -> LevelChange {
        let previous_level = self.level;
        self.xp -= amount;
        self.points = (self.points - amount).max(0);

        while self.xp < 0 && self.level > 1 {
            self.level -= 1;
            self.xp += curve.xp_for_next_level(self.level);
        }
        if self.xp < 0 {
            self.xp = 0;
        }

        LevelChange {
            xp_delta: -amount,
            previous_level,
            new_level: self.level,
        }
    }

    /// Whether a new daily reward window has opened at `now`.
    pub fn is_daily_reward_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_claimed_daily {
            None => true,
            Some(last) => {
                now.signed_duration_since(last) >= Duration::hours(DAILY_REWARD_COOLDOWN_HOURS)
            }
        }
    }

    /// Credit the daily reward and stamp the claim time. The stamp itself
    /// is what prevents the next stream emission from re-granting.
    pub fn claim_daily_reward(&mut self, points: i64, now: DateTime<Utc>) {
        self.points += points;
        self.last_claimed_daily = Some(now);
    }

    pub fn credit_coins(&mut self, amount: i64) {
        self.coins += amount;
    }

    pub fn can_afford(&self, price: i64) -> bool {
        self.points >= price
    }

    pub fn debit_points(&mut self, price: i64) -> Result<(), DomainError> {
        if !self.can_afford(price) {
            return Err(DomainError::Validation(format!(
                "Cannot debit {} points from a balance of {}",
                price, self.points
            )));
        }
        self.points -= price;
        Ok(())
    }

    pub fn owns_theme(&self, theme_id: &str) -> bool {
        theme_id == DEFAULT_THEME || self.unlocked_themes.iter().any(|t| t == theme_id)
    }

    pub fn unlock_theme(&mut self, theme_id: &str) {
        if !self.owns_theme(theme_id) {
            self.unlocked_themes.push(theme_id.to_string());
        }
    }

    /// Equipping is only valid for owned themes; the stores do not enforce
    /// this invariant, so the aggregate does.
    pub fn equip_theme(&mut self, theme_id: &str) -> Result<(), DomainError> {
        if !self.owns_theme(theme_id) {
            return Err(DomainError::Validation(format!(
                "Theme not unlocked: {}",
                theme_id
            )));
        }
        self.equipped_theme = theme_id.to_string();
        Ok(())
    }
}

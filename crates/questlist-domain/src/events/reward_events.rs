use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;

use crate::events::DomainEvent;
use crate::shared::UserId;

/// Macro to implement DomainEvent trait with type name
macro_rules! impl_domain_event {
    ($type:ty) => {
        impl DomainEvent for $type {
            fn as_any(&self) -> &(dyn Any + Send + Sync) {
                self
            }

            fn event_type_name(&self) -> &'static str {
                std::any::type_name::<Self>()
            }
        }
    };
}

/// Fired when completing a task credits XP ("+N XP" toast material).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpAwarded {
    pub user_id: UserId,
    pub xp: i64,
    pub previous_level: i64,
    pub new_level: i64,
    pub occurred_at: DateTime<Utc>,
}

impl XpAwarded {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.previous_level
    }
}

impl_domain_event!(XpAwarded);

/// Fired when the lazy daily check grants the daily reward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRewardGranted {
    pub user_id: UserId,
    pub points: i64,
    pub occurred_at: DateTime<Utc>,
}

impl_domain_event!(DailyRewardGranted);

/// Fired when a challenge reward is credited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeClaimed {
    pub user_id: UserId,
    pub challenge_id: String,
    pub coins: i64,
    pub occurred_at: DateTime<Utc>,
}

impl_domain_event!(ChallengeClaimed);

/// Fired when a shop purchase unlocks a cosmetic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeUnlocked {
    pub user_id: UserId,
    pub item_id: String,
    pub price: i64,
    pub occurred_at: DateTime<Utc>,
}

impl_domain_event!(ThemeUnlocked);

use std::sync::Arc;

use chrono::Utc;

use questlist_domain::events::{EventBus, ThemeUnlocked};
use questlist_domain::rewards::{find_shop_item, shop_catalog, PurchaseError};
use questlist_domain::shared::{DomainError, UserId};
use questlist_domain::stats::StatsRepository;

use crate::application::dtos::ShopItemDto;
use crate::application::services::{load_stats_or_default, publish_or_warn};

/// Shop purchases and theme equipping. Prices are in points; purchases
/// append the item id to the buyer's unlocked set.
pub struct ShopService {
    stats_repo: Arc<dyn StatsRepository>,
    event_bus: Arc<dyn EventBus>,
}

impl ShopService {
    pub fn new(stats_repo: Arc<dyn StatsRepository>, event_bus: Arc<dyn EventBus>) -> Self {
        Self {
            stats_repo,
            event_bus,
        }
    }

    /// The catalog annotated with this user's ownership and affordability.
    pub async fn catalog(&self, user_id: &UserId) -> Result<Vec<ShopItemDto>, DomainError> {
        let stats = load_stats_or_default(&self.stats_repo, user_id).await?;
        Ok(shop_catalog()
            .iter()
            .map(|item| ShopItemDto::from_item(item, &stats))
            .collect())
    }

    /// Buy an item. Rejections (`InsufficientFunds`, `AlreadyOwned`,
    /// `UnknownItem`) leave the stats record untouched.
    pub async fn purchase(&self, user_id: &UserId, item_id: &str) -> Result<(), PurchaseError> {
        let item = find_shop_item(item_id)
            .ok_or_else(|| PurchaseError::UnknownItem(item_id.to_string()))?;

        let mut stats = load_stats_or_default(&self.stats_repo, user_id).await?;
        if stats.owns_theme(item.id) {
            return Err(PurchaseError::AlreadyOwned(item.id.to_string()));
        }
        if !stats.can_afford(item.price) {
            return Err(PurchaseError::InsufficientFunds {
                price: item.price,
                balance: stats.points(),
            });
        }

        stats.debit_points(item.price)?;
        stats.unlock_theme(item.id);
        self.stats_repo.save(&stats).await?;

        publish_or_warn(
            &self.event_bus,
            Box::new(ThemeUnlocked {
                user_id: user_id.clone(),
                item_id: item.id.to_string(),
                price: item.price,
                occurred_at: Utc::now(),
            }),
        )
        .await;
        Ok(())
    }

    /// Equip an unlocked theme (or `"default"`, which everyone owns).
    pub async fn equip(&self, user_id: &UserId, theme_id: &str) -> Result<(), DomainError> {
        let mut stats = load_stats_or_default(&self.stats_repo, user_id).await?;
        stats.equip_theme(theme_id)?;
        self.stats_repo.save(&stats).await
    }
}

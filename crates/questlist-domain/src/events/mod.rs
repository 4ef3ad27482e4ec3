use std::any::Any;

pub mod event_bus;
pub mod reward_events;

pub use event_bus::{EventBus, EventHandler};
pub use reward_events::{ChallengeClaimed, DailyRewardGranted, ThemeUnlocked, XpAwarded};

/// Base trait for all domain events
/// All events must be Send + Sync for thread safety
pub trait DomainEvent: Send + Sync + Any {
    /// Convert to Any for type-safe downcasting
    fn as_any(&self) -> &(dyn Any + Send + Sync);

    fn event_type_name(&self) -> &'static str;
}

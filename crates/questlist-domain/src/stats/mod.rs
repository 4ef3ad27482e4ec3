mod aggregate;
mod repository;

pub use aggregate::{LevelChange, StatsRecord, DEFAULT_THEME};
pub use repository::{RemoteStatsGateway, StatsRepository};

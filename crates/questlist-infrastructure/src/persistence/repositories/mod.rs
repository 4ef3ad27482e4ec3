pub mod claims_repo;
pub mod stats_repo;
pub mod syncing_stats_repo;
pub mod task_repo;

pub use claims_repo::SqliteClaimsRepository;
pub use stats_repo::SqliteStatsRepository;
pub use syncing_stats_repo::SyncingStatsRepository;
pub use task_repo::SqliteTaskRepository;

use std::sync::Arc;

use anyhow::{Context, Result};

use questlist_domain::challenge::ClaimsRepository;
use questlist_domain::events::{ChallengeClaimed, DailyRewardGranted, EventBus, XpAwarded};
use questlist_domain::stats::{RemoteStatsGateway, StatsRepository};
use questlist_domain::task::TaskRepository;
use questlist_infrastructure::config::AppConfig;
use questlist_infrastructure::events::InMemoryEventBus;
use questlist_infrastructure::http::HttpRemoteStatsGateway;
use questlist_infrastructure::logging::init_logger;
use questlist_infrastructure::persistence::repositories::{
    SqliteClaimsRepository, SqliteStatsRepository, SqliteTaskRepository, SyncingStatsRepository,
};
use questlist_infrastructure::persistence::Database;

use crate::application::handlers::RewardAuditHandler;
use crate::application::services::{
    ChallengeService, LeaderboardService, ProfileService, ProgressionService, ShopService,
};

/// Wired engine surface. Everything a caller (UI, CLI, tests) needs hangs
/// off this context.
pub struct AppContext {
    pub config: AppConfig,
    pub event_bus: Arc<InMemoryEventBus>,
    pub progression: Arc<ProgressionService>,
    pub challenges: Arc<ChallengeService>,
    pub shop: Arc<ShopService>,
    pub leaderboard: Arc<LeaderboardService>,
    pub profile: Arc<ProfileService>,
}

/// Build the full dependency graph from a configuration: logging, the
/// SQLite cache with migrations, the optional remote gateway, the event
/// bus, and the application services on top.
pub async fn bootstrap(config: AppConfig) -> Result<AppContext> {
    init_logger(config.log_dir.clone()).context("Failed to initialize logging")?;

    let database = Database::open(&config.db_path)
        .await
        .context("Failed to open database")?;
    database
        .run_migrations()
        .await
        .context("Failed to run migrations")?;
    let pool = Arc::new(database.pool().clone());

    let task_repo: Arc<dyn TaskRepository> = Arc::new(SqliteTaskRepository::new(pool.clone()));
    let claims_repo: Arc<dyn ClaimsRepository> =
        Arc::new(SqliteClaimsRepository::new(pool.clone()));
    let local_stats = Arc::new(SqliteStatsRepository::new(pool));

    let (stats_repo, remote): (Arc<dyn StatsRepository>, Option<Arc<dyn RemoteStatsGateway>>) =
        match &config.remote_base_url {
            Some(base_url) => {
                let gateway: Arc<dyn RemoteStatsGateway> = Arc::new(
                    HttpRemoteStatsGateway::new(base_url.clone())
                        .context("Failed to build remote stats gateway")?,
                );
                tracing::info!("Remote stats sync enabled: {}", base_url);
                (
                    Arc::new(SyncingStatsRepository::new(local_stats, gateway.clone())),
                    Some(gateway),
                )
            }
            None => {
                tracing::info!("Running local-only, no remote stats sync");
                (local_stats, None)
            }
        };

    let event_bus = Arc::new(InMemoryEventBus::new());
    event_bus.subscribe::<XpAwarded, _>(RewardAuditHandler).await;
    event_bus
        .subscribe::<DailyRewardGranted, _>(RewardAuditHandler)
        .await;
    event_bus
        .subscribe::<ChallengeClaimed, _>(RewardAuditHandler)
        .await;
    let bus: Arc<dyn EventBus> = event_bus.clone();

    let progression = Arc::new(ProgressionService::new(
        task_repo.clone(),
        stats_repo.clone(),
        bus.clone(),
        config.level_curve,
    ));
    let challenges = Arc::new(ChallengeService::new(
        task_repo.clone(),
        claims_repo,
        stats_repo.clone(),
        bus,
    ));
    let shop = Arc::new(ShopService::new(stats_repo.clone(), event_bus.clone()));
    let leaderboard = Arc::new(LeaderboardService::new(
        stats_repo.clone(),
        remote,
        config.leaderboard_limit,
    ));
    let profile = Arc::new(ProfileService::new(
        stats_repo,
        task_repo,
        config.level_curve,
    ));

    Ok(AppContext {
        config,
        event_bus,
        progression,
        challenges,
        shop,
        leaderboard,
        profile,
    })
}

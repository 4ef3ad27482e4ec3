use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use questlist_domain::shared::DomainError;
use questlist_domain::stats::{RemoteStatsGateway, StatsRecord, StatsRepository};

use crate::application::dtos::LeaderboardEntryDto;

/// Live leaderboard projection. Dropping the feed aborts the background
/// projection task.
pub struct LeaderboardFeed {
    receiver: watch::Receiver<Vec<LeaderboardEntryDto>>,
    handle: JoinHandle<()>,
}

impl LeaderboardFeed {
    pub fn receiver(&self) -> watch::Receiver<Vec<LeaderboardEntryDto>> {
        self.receiver.clone()
    }
}

impl Drop for LeaderboardFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Ranking over the cached stats records: level descending, points
/// descending as the tie-break, truncated to the configured size.
pub struct LeaderboardService {
    stats_repo: Arc<dyn StatsRepository>,
    remote: Option<Arc<dyn RemoteStatsGateway>>,
    limit: usize,
}

impl LeaderboardService {
    pub fn new(
        stats_repo: Arc<dyn StatsRepository>,
        remote: Option<Arc<dyn RemoteStatsGateway>>,
        limit: usize,
    ) -> Self {
        Self {
            stats_repo,
            remote,
            limit,
        }
    }

    fn rank(mut records: Vec<StatsRecord>, limit: usize) -> Vec<LeaderboardEntryDto> {
        records.sort_by(|a, b| {
            b.level()
                .cmp(&a.level())
                .then(b.points().cmp(&a.points()))
        });
        records.truncate(limit);
        records
            .iter()
            .enumerate()
            .map(|(i, record)| LeaderboardEntryDto::from_record(i + 1, record))
            .collect()
    }

    /// One-shot snapshot from the local cache.
    pub async fn top(&self) -> Result<Vec<LeaderboardEntryDto>, DomainError> {
        Ok(Self::rank(self.stats_repo.find_all().await?, self.limit))
    }

    /// Live feed re-ranked on every stats store change.
    pub async fn observe(&self) -> Result<LeaderboardFeed, DomainError> {
        let mut all_rx = self.stats_repo.observe_all().await?;
        let limit = self.limit;

        let initial = Self::rank(all_rx.borrow_and_update().clone(), limit);
        let (tx, rx) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            while all_rx.changed().await.is_ok() {
                let records = all_rx.borrow_and_update().clone();
                tx.send_replace(Self::rank(records, limit));
            }
        });

        Ok(LeaderboardFeed {
            receiver: rx,
            handle,
        })
    }

    /// Pull the remote top records into the local cache. Remote failure
    /// degrades to the cached rows with a warning; local-only setups are a
    /// no-op.
    pub async fn refresh(&self) -> Result<(), DomainError> {
        let Some(remote) = &self.remote else {
            return Ok(());
        };
        match remote.fetch_top(self.limit).await {
            Ok(records) => self.stats_repo.upsert_many(&records).await,
            Err(e) => {
                tracing::warn!("Leaderboard refresh failed, serving cached rows: {}", e);
                Ok(())
            }
        }
    }
}

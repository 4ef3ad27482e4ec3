use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, RwLock};

use questlist_domain::challenge::{ClaimError, ClaimRecord, ClaimsRepository};
use questlist_domain::events::{DomainEvent, EventBus};
use questlist_domain::rewards::{LevelCurve, PurchaseError};
use questlist_domain::shared::{DomainError, TaskId, UserId};
use questlist_domain::stats::{RemoteStatsGateway, StatsRecord, StatsRepository};
use questlist_domain::task::{Difficulty, TaskRecord, TaskRepository};

use crate::application::services::{
    ChallengeService, LeaderboardService, ProfileService, ProgressionService, ShopService,
};

// Mock repositories and services for testing

struct MockTaskRepository {
    tasks: RwLock<HashMap<String, TaskRecord>>,
    sender: watch::Sender<Vec<TaskRecord>>,
}

impl MockTaskRepository {
    fn new() -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self {
            tasks: RwLock::new(HashMap::new()),
            sender,
        }
    }

    async fn notify(&self) {
        let tasks: Vec<TaskRecord> = self.tasks.read().await.values().cloned().collect();
        self.sender.send_replace(tasks);
    }
}

#[async_trait::async_trait]
impl TaskRepository for MockTaskRepository {
    async fn observe(
        &self,
        _owner_id: &UserId,
    ) -> Result<watch::Receiver<Vec<TaskRecord>>, DomainError> {
        self.notify().await;
        Ok(self.sender.subscribe())
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<TaskRecord>, DomainError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .values()
            .filter(|t| t.owner_id() == owner_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<TaskRecord>, DomainError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(id.as_str()).cloned())
    }

    async fn insert(&self, task: &TaskRecord) -> Result<(), DomainError> {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id().as_str().to_string(), task.clone());
        drop(tasks);
        self.notify().await;
        Ok(())
    }

    async fn update(&self, task: &TaskRecord) -> Result<(), DomainError> {
        self.insert(task).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), DomainError> {
        let mut tasks = self.tasks.write().await;
        tasks.remove(id.as_str());
        drop(tasks);
        self.notify().await;
        Ok(())
    }
}

struct MockStatsRepository {
    records: RwLock<HashMap<String, StatsRecord>>,
    all_sender: watch::Sender<Vec<StatsRecord>>,
}

impl MockStatsRepository {
    fn new() -> Self {
        let (all_sender, _) = watch::channel(Vec::new());
        Self {
            records: RwLock::new(HashMap::new()),
            all_sender,
        }
    }

    async fn notify(&self) {
        let records: Vec<StatsRecord> = self.records.read().await.values().cloned().collect();
        self.all_sender.send_replace(records);
    }
}

#[async_trait::async_trait]
impl StatsRepository for MockStatsRepository {
    async fn observe(
        &self,
        user_id: &UserId,
    ) -> Result<watch::Receiver<Option<StatsRecord>>, DomainError> {
        let (_, rx) = watch::channel(self.find_by_user_id(user_id).await?);
        Ok(rx)
    }

    async fn observe_all(&self) -> Result<watch::Receiver<Vec<StatsRecord>>, DomainError> {
        self.notify().await;
        Ok(self.all_sender.subscribe())
    }

    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<StatsRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(user_id.as_str()).cloned())
    }

    async fn find_all(&self) -> Result<Vec<StatsRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }

    async fn save(&self, stats: &StatsRecord) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        records.insert(stats.user_id().as_str().to_string(), stats.clone());
        drop(records);
        self.notify().await;
        Ok(())
    }

    async fn upsert_many(&self, incoming: &[StatsRecord]) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        for stats in incoming {
            records.insert(stats.user_id().as_str().to_string(), stats.clone());
        }
        drop(records);
        self.notify().await;
        Ok(())
    }
}

struct MockClaimsRepository {
    claims: RwLock<HashMap<String, ClaimRecord>>,
    sender: watch::Sender<BTreeSet<String>>,
}

impl MockClaimsRepository {
    fn new() -> Self {
        let (sender, _) = watch::channel(BTreeSet::new());
        Self {
            claims: RwLock::new(HashMap::new()),
            sender,
        }
    }

    async fn notify(&self) {
        let ids: BTreeSet<String> = self.claims.read().await.keys().cloned().collect();
        self.sender.send_replace(ids);
    }
}

#[async_trait::async_trait]
impl ClaimsRepository for MockClaimsRepository {
    async fn observe_all(
        &self,
        _user_id: &UserId,
    ) -> Result<watch::Receiver<BTreeSet<String>>, DomainError> {
        self.notify().await;
        Ok(self.sender.subscribe())
    }

    async fn claimed_ids(&self, _user_id: &UserId) -> Result<BTreeSet<String>, DomainError> {
        let claims = self.claims.read().await;
        Ok(claims.keys().cloned().collect())
    }

    async fn record_claim(
        &self,
        _user_id: &UserId,
        challenge_id: &str,
    ) -> Result<bool, DomainError> {
        let mut claims = self.claims.write().await;
        if claims.contains_key(challenge_id) {
            return Ok(false);
        }
        claims.insert(
            challenge_id.to_string(),
            ClaimRecord {
                challenge_id: challenge_id.to_string(),
                claimed_at: Utc::now(),
                credited: false,
            },
        );
        drop(claims);
        self.notify().await;
        Ok(true)
    }

    async fn mark_credited(
        &self,
        _user_id: &UserId,
        challenge_id: &str,
    ) -> Result<(), DomainError> {
        let mut claims = self.claims.write().await;
        if let Some(claim) = claims.get_mut(challenge_id) {
            claim.credited = true;
        }
        Ok(())
    }

    async fn find_uncredited(&self, _user_id: &UserId) -> Result<Vec<ClaimRecord>, DomainError> {
        let claims = self.claims.read().await;
        Ok(claims.values().filter(|c| !c.credited).cloned().collect())
    }
}

struct MockEventBus {
    event_count: RwLock<usize>,
}

impl MockEventBus {
    fn new() -> Self {
        Self {
            event_count: RwLock::new(0),
        }
    }

    async fn get_event_count(&self) -> usize {
        *self.event_count.read().await
    }
}

#[async_trait::async_trait]
impl EventBus for MockEventBus {
    async fn publish(&self, _event: Box<dyn DomainEvent>) -> Result<(), DomainError> {
        let mut count = self.event_count.write().await;
        *count += 1;
        Ok(())
    }
}

struct MockRemoteGateway {
    top: Vec<StatsRecord>,
}

#[async_trait::async_trait]
impl RemoteStatsGateway for MockRemoteGateway {
    async fn fetch(&self, _user_id: &UserId) -> Result<Option<StatsRecord>, DomainError> {
        Ok(None)
    }

    async fn upsert(&self, _stats: &StatsRecord) -> Result<(), DomainError> {
        Ok(())
    }

    async fn fetch_top(&self, limit: usize) -> Result<Vec<StatsRecord>, DomainError> {
        Ok(self.top.iter().take(limit).cloned().collect())
    }
}

// Test fixtures

struct Fixture {
    task_repo: Arc<MockTaskRepository>,
    stats_repo: Arc<MockStatsRepository>,
    claims_repo: Arc<MockClaimsRepository>,
    event_bus: Arc<MockEventBus>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            task_repo: Arc::new(MockTaskRepository::new()),
            stats_repo: Arc::new(MockStatsRepository::new()),
            claims_repo: Arc::new(MockClaimsRepository::new()),
            event_bus: Arc::new(MockEventBus::new()),
        }
    }

    fn progression(&self) -> ProgressionService {
        ProgressionService::new(
            self.task_repo.clone(),
            self.stats_repo.clone(),
            self.event_bus.clone(),
            LevelCurve::Flat,
        )
    }

    fn challenges(&self) -> ChallengeService {
        ChallengeService::new(
            self.task_repo.clone(),
            self.claims_repo.clone(),
            self.stats_repo.clone(),
            self.event_bus.clone(),
        )
    }

    fn shop(&self) -> ShopService {
        ShopService::new(self.stats_repo.clone(), self.event_bus.clone())
    }

    fn profile(&self) -> ProfileService {
        ProfileService::new(
            self.stats_repo.clone(),
            self.task_repo.clone(),
            LevelCurve::Flat,
        )
    }

    async fn seed_task(&self, owner: &UserId, difficulty: Difficulty, completed: bool) -> TaskRecord {
        let mut task = TaskRecord::new(
            owner.clone(),
            "Task".to_string(),
            None,
            "general".to_string(),
            difficulty,
            None,
        )
        .unwrap();
        task.set_completed(completed);
        self.task_repo.insert(&task).await.unwrap();
        task
    }

    async fn stats(&self, user: &UserId) -> StatsRecord {
        self.stats_repo
            .find_by_user_id(user)
            .await
            .unwrap()
            .expect("stats record should exist")
    }
}

// Tests

#[tokio::test]
async fn test_toggle_awards_then_reverts_symmetrically() {
    let fx = Fixture::new();
    let user = UserId::new();

    let mut seeded = StatsRecord::new(user.clone(), "Tester".to_string());
    seeded.award_xp(90, LevelCurve::Flat);
    fx.stats_repo.save(&seeded).await.unwrap();

    let task = fx.seed_task(&user, Difficulty::Medium, false).await;
    let service = fx.progression();

    // incomplete -> complete: +25 carries into level 2
    let dto = service.toggle_task_completion(task.id()).await.unwrap();
    assert!(dto.completed);
    assert!(dto.leveled_up());
    let stats = fx.stats(&user).await;
    assert_eq!(stats.level(), 2);
    assert_eq!(stats.xp(), 15);
    assert_eq!(stats.points(), 115);
    assert_eq!(fx.event_bus.get_event_count().await, 1);

    // complete -> incomplete: the same yield comes back off
    let dto = service.toggle_task_completion(task.id()).await.unwrap();
    assert!(!dto.completed);
    let stats = fx.stats(&user).await;
    assert_eq!(stats.level(), 1);
    assert_eq!(stats.xp(), 90);
    assert_eq!(stats.points(), 90);

    // no award event for the revert
    assert_eq!(fx.event_bus.get_event_count().await, 1);

    // completing again nets exactly one completion's yield
    service.toggle_task_completion(task.id()).await.unwrap();
    let stats = fx.stats(&user).await;
    assert_eq!(stats.level(), 2);
    assert_eq!(stats.xp(), 15);
    assert_eq!(stats.points(), 115);
}

#[tokio::test]
async fn test_toggle_unknown_task_fails() {
    let fx = Fixture::new();
    let result = fx.progression().toggle_task_completion(&TaskId::new()).await;
    assert!(matches!(result, Err(DomainError::NotFound(_))));
}

#[tokio::test]
async fn test_daily_reward_granted_exactly_once_per_window() {
    let fx = Fixture::new();
    let user = UserId::new();
    let service = fx.progression();

    // no record yet: one is synthesized and granted
    let granted = service.check_daily_reward(&user).await.unwrap();
    assert_eq!(granted, Some(25));
    let stats = fx.stats(&user).await;
    assert_eq!(stats.points(), 25);
    assert!(stats.last_claimed_daily().is_some());

    // the stamped record blocks a second grant
    let granted = service.check_daily_reward(&user).await.unwrap();
    assert_eq!(granted, None);
    assert_eq!(fx.stats(&user).await.points(), 25);
    assert_eq!(fx.event_bus.get_event_count().await, 1);
}

#[tokio::test]
async fn test_claim_challenge_credits_coins_once() {
    let fx = Fixture::new();
    let user = UserId::new();
    fx.seed_task(&user, Difficulty::Easy, true).await;
    let service = fx.challenges();

    let coins = service.claim_challenge(&user, "first_step").await.unwrap();
    assert_eq!(coins, 10);
    assert_eq!(fx.stats(&user).await.coins(), 10);
    assert!(fx
        .claims_repo
        .find_uncredited(&user)
        .await
        .unwrap()
        .is_empty());

    // second claim is rejected and does not credit again
    let result = service.claim_challenge(&user, "first_step").await;
    assert!(matches!(result, Err(ClaimError::NotEligible(_))));
    assert_eq!(fx.stats(&user).await.coins(), 10);
    assert_eq!(fx.event_bus.get_event_count().await, 1);
}

#[tokio::test]
async fn test_claim_rejects_unmet_target() {
    let fx = Fixture::new();
    let user = UserId::new();
    fx.seed_task(&user, Difficulty::Easy, true).await;
    let service = fx.challenges();

    match service.claim_challenge(&user, "productive").await {
        Err(ClaimError::NotEligible(msg)) => assert!(msg.contains("1/3")),
        other => panic!("Expected NotEligible, got {:?}", other.err()),
    }

    // nothing was written
    assert!(fx.claims_repo.claimed_ids(&user).await.unwrap().is_empty());
    assert!(fx.stats_repo.find_by_user_id(&user).await.unwrap().is_none());
}

#[tokio::test]
async fn test_claim_unknown_challenge_fails() {
    let fx = Fixture::new();
    let result = fx
        .challenges()
        .claim_challenge(&UserId::new(), "consistency")
        .await;
    assert!(matches!(result, Err(ClaimError::NotEligible(_))));
}

#[tokio::test]
async fn test_settle_uncredited_credits_exactly_once() {
    let fx = Fixture::new();
    let user = UserId::new();

    // a claim whose credit never landed
    fx.claims_repo.record_claim(&user, "challenger").await.unwrap();
    let service = fx.challenges();

    let settled = service.settle_uncredited(&user).await.unwrap();
    assert_eq!(settled, 1);
    assert_eq!(fx.stats(&user).await.coins(), 25);

    // settled rows stay settled
    let settled = service.settle_uncredited(&user).await.unwrap();
    assert_eq!(settled, 0);
    assert_eq!(fx.stats(&user).await.coins(), 25);
}

#[tokio::test]
async fn test_purchase_rules() {
    let fx = Fixture::new();
    let user = UserId::new();
    let service = fx.shop();

    // broke: rejection leaves the record untouched
    match service.purchase(&user, "cyber").await {
        Err(PurchaseError::InsufficientFunds { price, balance }) => {
            assert_eq!(price, 50);
            assert_eq!(balance, 0);
        }
        other => panic!("Expected InsufficientFunds, got {:?}", other.err()),
    }
    assert!(fx.stats_repo.find_by_user_id(&user).await.unwrap().is_none());

    // funded: debit + unlock
    let mut seeded = StatsRecord::new(user.clone(), "Buyer".to_string());
    seeded.award_xp(60, LevelCurve::Flat);
    fx.stats_repo.save(&seeded).await.unwrap();

    service.purchase(&user, "cyber").await.unwrap();
    let stats = fx.stats(&user).await;
    assert_eq!(stats.points(), 10);
    assert!(stats.owns_theme("cyber"));
    assert_eq!(fx.event_bus.get_event_count().await, 1);

    // owned items cannot be bought twice
    let result = service.purchase(&user, "cyber").await;
    assert!(matches!(result, Err(PurchaseError::AlreadyOwned(_))));

    let result = service.purchase(&user, "nonexistent").await;
    assert!(matches!(result, Err(PurchaseError::UnknownItem(_))));

    // purchased themes can be equipped
    service.equip(&user, "cyber").await.unwrap();
    assert_eq!(fx.stats(&user).await.equipped_theme(), "cyber");
}

#[tokio::test]
async fn test_leaderboard_orders_by_level_then_points() {
    let fx = Fixture::new();
    let records = [
        ("alice", 9, 5),
        ("bob", 1, 5),
        ("carol", 10, 3),
    ];
    for (name, points, level) in records {
        let stats = StatsRecord::restore(
            UserId::from_string(name),
            name.to_string(),
            points,
            level,
            0,
            0,
            None,
            "default".to_string(),
            Vec::new(),
        );
        fx.stats_repo.save(&stats).await.unwrap();
    }

    let service = LeaderboardService::new(fx.stats_repo.clone(), None, 50);
    let top = service.top().await.unwrap();
    let order: Vec<&str> = top.iter().map(|e| e.display_name.as_str()).collect();
    assert_eq!(order, ["alice", "bob", "carol"]);
    assert_eq!(top[0].rank, 1);
    assert_eq!(top[2].rank, 3);

    // the limit truncates after sorting
    let limited = LeaderboardService::new(fx.stats_repo.clone(), None, 2);
    assert_eq!(limited.top().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_leaderboard_refresh_pulls_remote_into_cache() {
    let fx = Fixture::new();
    let remote = Arc::new(MockRemoteGateway {
        top: vec![
            StatsRecord::new(UserId::from_string("remote-1"), "One".to_string()),
            StatsRecord::new(UserId::from_string("remote-2"), "Two".to_string()),
        ],
    });

    let service = LeaderboardService::new(fx.stats_repo.clone(), Some(remote), 50);
    service.refresh().await.unwrap();
    assert_eq!(fx.stats_repo.find_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_challenge_feed_reacts_to_task_changes() {
    let fx = Fixture::new();
    let user = UserId::new();
    let service = fx.challenges();

    let feed = service.observe_challenges(&user).await.unwrap();
    let mut rx = feed.receiver();
    {
        let views = rx.borrow_and_update();
        let first_step = views.iter().find(|v| v.id == "first_step").unwrap();
        assert_eq!(first_step.current, 0);
        assert!(!first_step.completed);
    }

    fx.seed_task(&user, Difficulty::Easy, true).await;

    rx.changed().await.unwrap();
    let views = rx.borrow_and_update();
    let first_step = views.iter().find(|v| v.id == "first_step").unwrap();
    assert_eq!(first_step.current, 1);
    assert!(first_step.completed);
    assert!(!first_step.claimed);
}

#[tokio::test]
async fn test_ensure_stats_creates_default_and_backfills_name() {
    let fx = Fixture::new();
    let service = fx.profile();

    // no record: default is created with the auth profile's name
    let user = UserId::new();
    let stats = service.ensure_stats(&user, "Alice").await.unwrap();
    assert_eq!(stats.user_name(), "Alice");
    assert_eq!(stats.level(), 1);
    assert_eq!(stats.points(), 0);

    // existing record with a blank name gets backfilled
    let blank_user = UserId::new();
    fx.stats_repo
        .save(&StatsRecord::new(blank_user.clone(), String::new()))
        .await
        .unwrap();
    let stats = service.ensure_stats(&blank_user, "Bob").await.unwrap();
    assert_eq!(stats.user_name(), "Bob");

    // a non-blank name is never overwritten
    let stats = service.ensure_stats(&user, "Other").await.unwrap();
    assert_eq!(stats.user_name(), "Alice");
}

#[tokio::test]
async fn test_profile_summary_projects_tasks() {
    let fx = Fixture::new();
    let user = UserId::new();
    fx.seed_task(&user, Difficulty::Easy, true).await;
    fx.seed_task(&user, Difficulty::Hard, true).await;
    fx.seed_task(&user, Difficulty::Medium, false).await;

    let summary = fx.profile().summary(&user).await.unwrap();
    assert_eq!(summary.completed_tasks, 2);
    assert_eq!(summary.pending_tasks, 1);
    assert_eq!(summary.favorite_category, Some("general".to_string()));
    assert_eq!(summary.xp_for_next_level, 100);
    assert_eq!(summary.display_name, "Player");
}

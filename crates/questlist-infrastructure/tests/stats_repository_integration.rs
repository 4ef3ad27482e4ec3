use std::sync::Arc;

use questlist_domain::rewards::LevelCurve;
use questlist_domain::shared::UserId;
use questlist_domain::stats::{StatsRecord, StatsRepository};
use questlist_infrastructure::persistence::repositories::SqliteStatsRepository;

mod test_helpers;

#[tokio::test]
async fn stats_repo_save_find_and_observe_integration() {
    let pool = test_helpers::setup_in_memory_db().await;
    let repo = SqliteStatsRepository::new(Arc::new(pool));

    let user_id = UserId::new();
    let mut rx = repo.observe(&user_id).await.expect("observe");
    assert!(rx.borrow().is_none());

    let mut stats = StatsRecord::new(user_id.clone(), "Alice".to_string());
    stats.award_xp(25, LevelCurve::Flat);
    stats.unlock_theme("cyber");
    repo.save(&stats).await.expect("save stats");

    // The save must push the committed record to observers.
    rx.changed().await.expect("observe emission");
    {
        let observed = rx.borrow_and_update();
        let observed = observed.as_ref().expect("record present");
        assert_eq!(observed.points(), 25);
        assert_eq!(observed.unlocked_themes(), ["cyber".to_string()]);
    }

    let fetched = repo
        .find_by_user_id(&user_id)
        .await
        .expect("find")
        .expect("should exist");
    assert_eq!(fetched.user_name(), "Alice");
    assert_eq!(fetched.xp(), 25);
    assert_eq!(fetched.level(), 1);

    // Upsert is a full-record replace (last-write-wins).
    let replacement = StatsRecord::new(user_id.clone(), "Alice B".to_string());
    repo.save(&replacement).await.expect("overwrite");
    let fetched = repo
        .find_by_user_id(&user_id)
        .await
        .expect("find")
        .expect("should exist");
    assert_eq!(fetched.points(), 0);
    assert_eq!(fetched.user_name(), "Alice B");
}

#[tokio::test]
async fn stats_repo_upsert_many_and_observe_all_integration() {
    let pool = test_helpers::setup_in_memory_db().await;
    let repo = SqliteStatsRepository::new(Arc::new(pool));

    let mut all_rx = repo.observe_all().await.expect("observe_all");
    assert!(all_rx.borrow_and_update().is_empty());

    let records: Vec<StatsRecord> = (0..3)
        .map(|i| StatsRecord::new(UserId::new(), format!("Player {}", i)))
        .collect();
    repo.upsert_many(&records).await.expect("upsert_many");

    all_rx.changed().await.expect("bulk emission");
    assert_eq!(all_rx.borrow().len(), 3);
    assert_eq!(repo.find_all().await.expect("find_all").len(), 3);
}

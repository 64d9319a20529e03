use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use ryker_rs::{config::Tuning, database::Database, events::EventHandler};
use tempfile::TempDir;

fn open_handler() -> (TempDir, Arc<Database>, EventHandler) {
    let dir = TempDir::new().unwrap();
    let db = Arc::new(Database::open(dir.path().to_path_buf(), Tuning::default()).unwrap());
    let events = EventHandler::new(db.clone());
    (dir, db, events)
}

#[tokio::test]
async fn passive_award_respects_the_cooldown() {
    let (_dir, db, events) = open_handler();
    let t0 = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();

    events.on_message("u1", "general", "Riley", t0).await.unwrap();
    let after_first = db.get_user("u1").await.unwrap().points;
    assert!((1..=3).contains(&after_first));

    // 5 seconds later: still on cooldown, message counted but no Vibe.
    events
        .on_message("u1", "general", "Riley", t0 + Duration::seconds(5))
        .await
        .unwrap();
    assert_eq!(db.get_user("u1").await.unwrap().points, after_first);

    events
        .on_message("u1", "general", "Riley", t0 + Duration::seconds(20))
        .await
        .unwrap();
    let after_third = db.get_user("u1").await.unwrap().points;
    assert!(after_third > after_first);

    // All three messages made it into the channel counters.
    let summary = db.activity_summary(t0, 5).await;
    assert_eq!(summary.top_channels.len(), 1);
    assert_eq!(summary.top_channels[0].channel_id, "general");
    assert_eq!(summary.top_channels[0].messages, 3);
}

#[tokio::test]
async fn cooldown_is_per_user() {
    let (_dir, db, events) = open_handler();
    let t0 = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();

    events.on_message("u1", "general", "Riley", t0).await.unwrap();
    events.on_message("u2", "general", "Sam", t0).await.unwrap();
    assert!(db.get_user("u1").await.unwrap().points >= 1);
    assert!(db.get_user("u2").await.unwrap().points >= 1);
}

#[tokio::test]
async fn joins_and_leaves_feed_the_churn_rate() {
    let (_dir, db, events) = open_handler();
    let t0 = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();

    for _ in 0..4 {
        events.on_member_join("x", t0).await.unwrap();
    }
    events.on_member_leave("x", t0).await.unwrap();

    let summary = db.activity_summary(t0, 5).await;
    assert_eq!(summary.joins_7d, 4);
    assert_eq!(summary.leaves_7d, 1);
    assert!((summary.churn_rate_30d - 25.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn churn_rate_is_zero_without_joins() {
    let (_dir, db, events) = open_handler();
    let t0 = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
    events.on_member_leave("x", t0).await.unwrap();

    let summary = db.activity_summary(t0, 5).await;
    assert_eq!(summary.joins_30d, 0);
    assert_eq!(summary.churn_rate_30d, 0.0);
}

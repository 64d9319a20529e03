use std::sync::Arc;

use chrono::{TimeZone, Utc};
use ryker_rs::{
    config::Tuning,
    database::Database,
    error::{EngineError, Precondition},
    events::{EventHandler, JoinCheck},
    models::ActionKind,
};
use tempfile::TempDir;

fn open_db() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let db = Database::open(dir.path().to_path_buf(), Tuning::default()).unwrap();
    (dir, db)
}

fn at(y: i32, m: u32, d: u32, h: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

#[tokio::test]
async fn record_action_validates_ids() {
    let (_dir, db) = open_db();
    assert!(matches!(
        db.record_action("", "mod1", ActionKind::Warn, "x", at(2026, 8, 23, 10)).await,
        Err(EngineError::InvalidArgument(_))
    ));
    assert!(matches!(
        db.record_action("u1", "", ActionKind::Warn, "x", at(2026, 8, 23, 10)).await,
        Err(EngineError::InvalidArgument(_))
    ));
    assert!(db.recent_entries(10).await.is_empty());
}

#[tokio::test]
async fn find_by_target_is_reverse_chronological() {
    let (_dir, db) = open_db();
    db.record_action("u1", "mod1", ActionKind::Warn, "first", at(2026, 8, 20, 10))
        .await
        .unwrap();
    db.record_action("u2", "mod1", ActionKind::Kick, "other user", at(2026, 8, 21, 10))
        .await
        .unwrap();
    db.record_action("u1", "mod2", ActionKind::Mute, "second", at(2026, 8, 22, 10))
        .await
        .unwrap();

    let history = db.find_by_target("u1").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].reason, "second");
    assert_eq!(history[1].reason, "first");
    assert!(history.iter().all(|e| e.target_id == "u1"));
}

#[tokio::test]
async fn bans_are_permanent() {
    let (_dir, db) = open_db();
    assert!(!db.is_banned("u1").await);

    db.record_action("u1", "mod1", ActionKind::Ban, "18+ rule", at(2026, 8, 23, 10))
        .await
        .unwrap();
    assert!(db.is_banned("u1").await);
    assert!(!db.is_banned("u2").await);

    // There is no unban action; a later unrelated entry changes nothing.
    db.record_action("u1", "mod1", ActionKind::Report, "rejoined?", at(2026, 8, 24, 10))
        .await
        .unwrap();
    assert!(db.is_banned("u1").await);
}

#[tokio::test]
async fn auto_reban_without_prior_ban_is_rejected() {
    let (_dir, db) = open_db();
    let err = db
        .record_action("u1", "system", ActionKind::AutoReban, "evasion", at(2026, 8, 23, 10))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::PreconditionFailed(Precondition::RebanWithoutBan(_))
    ));
    assert!(db.recent_entries(10).await.is_empty());

    db.record_action("u1", "mod1", ActionKind::Ban, "spam", at(2026, 8, 23, 11))
        .await
        .unwrap();
    db.record_action("u1", "system", ActionKind::AutoReban, "evasion", at(2026, 8, 24, 10))
        .await
        .unwrap();
    assert_eq!(db.find_by_target("u1").await.len(), 2);
}

#[tokio::test]
async fn monthly_action_totals_roll_over() {
    let (_dir, db) = open_db();
    db.record_action("u1", "mod1", ActionKind::Ban, "a", at(2026, 1, 15, 10))
        .await
        .unwrap();
    db.record_action("u2", "mod1", ActionKind::Warn, "b", at(2026, 1, 20, 10))
        .await
        .unwrap();

    let summary = db.activity_summary(at(2026, 1, 21, 0), 5).await;
    assert_eq!(summary.month, "2026-01");
    assert_eq!(summary.action_totals.get(&ActionKind::Ban), Some(&1));
    assert_eq!(summary.action_totals.get(&ActionKind::Warn), Some(&1));

    db.record_action("u3", "mod1", ActionKind::Kick, "c", at(2026, 2, 1, 10))
        .await
        .unwrap();
    let summary = db.activity_summary(at(2026, 2, 2, 0), 5).await;
    assert_eq!(summary.month, "2026-02");
    assert_eq!(summary.action_totals.get(&ActionKind::Ban), None);
    assert_eq!(summary.action_totals.get(&ActionKind::Kick), Some(&1));
}

#[tokio::test]
async fn rejoining_evader_is_flagged_and_reban_references_original_reason() {
    let (_dir, db) = open_db();
    let db = Arc::new(db);
    let events = EventHandler::new(db.clone());

    db.record_action("u1", "mod1", ActionKind::Ban, "18+ rule", at(2026, 8, 20, 10))
        .await
        .unwrap();

    match events.on_member_join("u1", at(2026, 8, 23, 10)).await.unwrap() {
        JoinCheck::BannedEvader { original_ban } => {
            assert_eq!(original_ban.reason, "18+ rule");
        }
        JoinCheck::Welcomed => panic!("banned member must be flagged"),
    }

    // The gateway enforces the ban out of band, then confirms.
    let entry = events.confirm_reban("u1", at(2026, 8, 23, 10)).await.unwrap();
    assert_eq!(entry.action, ActionKind::AutoReban);
    assert_eq!(entry.actor_id, "system");
    assert!(entry.reason.contains("18+ rule"));

    match events.on_member_join("clean", at(2026, 8, 23, 11)).await.unwrap() {
        JoinCheck::Welcomed => {}
        JoinCheck::BannedEvader { .. } => panic!("clean member flagged"),
    }
}

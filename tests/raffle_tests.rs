use chrono::{TimeZone, Utc};
use ryker_rs::{
    config::Tuning,
    database::Database,
    error::{EngineError, Precondition},
};
use tempfile::TempDir;

fn open_db() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    // Defaults: minimum pool 10_000, maximum 35_000.
    let db = Database::open(dir.path().to_path_buf(), Tuning::default()).unwrap();
    (dir, db)
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 23, 20, 0, 0).unwrap()
}

/// Funds the pool through the only real inflow: ticket purchases at 100 Vibe
/// apiece.
async fn buy_tickets(db: &Database, user: &str, n: u64) {
    db.award_points(user, None, (n * 100) as i64).await.unwrap();
    for _ in 0..n {
        db.purchase(user, "raffle_ticket", None).await.unwrap();
    }
}

#[tokio::test]
async fn draw_below_minimum_pool_fails_and_leaves_pool_untouched() {
    let (_dir, db) = open_db();
    buy_tickets(&db, "u1", 50).await; // pool 5_000

    let err = db.draw_raffle(now()).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::PreconditionFailed(Precondition::PoolBelowMinimum {
            pool: 5_000,
            minimum: 10_000
        })
    ));

    let pool = db.raffle_pool().await;
    assert_eq!(pool.pool_amount, 5_000);
    assert_eq!(pool.ticket_holders.len(), 50);
}

#[tokio::test]
async fn draw_without_tickets_fails() {
    let (_dir, db) = open_db();
    // Cosmetics feed the pool without creating tickets.
    db.award_points("u1", None, 10_000).await.unwrap();
    for _ in 0..50 {
        db.purchase("u1", "icon_househeart", None).await.unwrap();
    }
    assert_eq!(db.raffle_pool().await.pool_amount, 10_000);

    let err = db.draw_raffle(now()).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::PreconditionFailed(Precondition::NoTickets)
    ));
    assert_eq!(db.raffle_pool().await.pool_amount, 10_000);
}

#[tokio::test]
async fn draw_caps_prize_and_rolls_over_the_excess() {
    let (_dir, db) = open_db();
    buy_tickets(&db, "u1", 400).await; // pool 40_000, balance back to 0

    let outcome = db.draw_raffle(now()).await.unwrap();
    assert_eq!(outcome.winner_id, "u1");
    assert_eq!(outcome.prize, 35_000);
    assert_eq!(outcome.rollover, 5_000);
    assert_eq!(outcome.tickets_in_draw, 400);

    let pool = db.raffle_pool().await;
    assert_eq!(pool.pool_amount, 5_000);
    assert!(pool.ticket_holders.is_empty());

    let winner = db.get_user("u1").await.unwrap();
    assert_eq!(winner.points, 35_000);
    // 40_000 earned from awards plus the 35_000 prize.
    assert_eq!(winner.total_points_earned, 75_000);
}

#[tokio::test]
async fn winner_holds_a_ticket() {
    let (_dir, db) = open_db();
    buy_tickets(&db, "a", 60).await;
    buy_tickets(&db, "b", 40).await;

    let outcome = db.draw_raffle(now()).await.unwrap();
    assert!(outcome.winner_id == "a" || outcome.winner_id == "b");
    assert_eq!(outcome.prize, 10_000);
    assert_eq!(outcome.rollover, 0);
}

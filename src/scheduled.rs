use std::sync::Arc;

use clokwerk::{Job, Scheduler, TimeUnits};
use tokio::runtime::Handle;

use crate::{database::Database, error::EngineError};

type SetupFn = fn(&mut Scheduler, Handle, Arc<Database>) -> ();

pub const SETUP_FUNCTIONS: [&SetupFn; 2] = [
    &(setup_raffle_draw as SetupFn),
    &(setup_flush as SetupFn),
];

fn setup_raffle_draw(scheduler: &mut Scheduler, handle: Handle, db: Arc<Database>) {
    scheduler.every(1.day()).at("20:00").run(move || {
        handle.block_on(draw_raffle(db.clone()));
    });
}

/// Retries saves that failed after a mutation, so a transient disk error never
/// costs more than one flush interval of durability.
fn setup_flush(scheduler: &mut Scheduler, handle: Handle, db: Arc<Database>) {
    scheduler.every(30.seconds()).run(move || {
        let db = db.clone();
        handle.block_on(async move { db.flush().await });
    });
}

async fn draw_raffle(db: Arc<Database>) {
    match db.draw_raffle(chrono::Utc::now()).await {
        Ok(outcome) => info!(
            "Raffle drawn: {} won {} Vibe out of {} tickets, {} rolls over",
            outcome.winner_id, outcome.prize, outcome.tickets_in_draw, outcome.rollover
        ),
        // An underfunded or ticketless pool is the normal case, not a fault.
        Err(EngineError::PreconditionFailed(p)) => info!("Raffle not drawn tonight: {}", p),
        Err(e) => error!("Raffle draw failed: {}", e),
    }
}

use chrono::{DateTime, Utc};
use rand::Rng;

use super::{economy::credit, user_entry, Database};
use crate::{
    error::{EngineError, Precondition},
    models::RafflePool,
    rank::RankChange,
};

#[derive(Debug, Clone, Serialize)]
pub struct DrawOutcome {
    pub winner_id: String,
    pub prize: u64,
    /// Pool amount above the prize cap, seeding the next pool.
    pub rollover: u64,
    pub tickets_in_draw: usize,
    pub drawn_at: DateTime<Utc>,
    pub rank_change: Option<RankChange>,
}

impl Database {
    /// Draws the pooled raffle: one winner, uniform over tickets, credited
    /// with `min(pool, maximum_pool)`. The remainder rolls over and the
    /// ticket multiset is cleared. Refuses below the minimum pool so small
    /// pots keep accumulating.
    pub async fn draw_raffle(&self, now: DateTime<Utc>) -> Result<DrawOutcome, EngineError> {
        let minimum = self.tuning.raffle_minimum_pool;
        let maximum = self.tuning.raffle_maximum_pool;
        self.mutate(move |state| {
            let pool = state.raffle.pool_amount;
            if pool < minimum {
                return Err(Precondition::PoolBelowMinimum { pool, minimum }.into());
            }
            let tickets_in_draw = state.raffle.ticket_holders.len();
            if tickets_in_draw == 0 {
                return Err(Precondition::NoTickets.into());
            }

            let pick = rand::thread_rng().gen_range(0..tickets_in_draw);
            let winner_id = state.raffle.ticket_holders[pick].clone();

            let prize = pool.min(maximum);
            let rollover = pool - prize;

            let winner = user_entry(state, &winner_id);
            let rank_change = credit(winner, prize);

            state.raffle.ticket_holders.clear();
            state.raffle.pool_amount = rollover;

            Ok(DrawOutcome {
                winner_id,
                prize,
                rollover,
                tickets_in_draw,
                drawn_at: now,
                rank_change,
            })
        })
        .await
    }

    pub async fn raffle_pool(&self) -> RafflePool {
        self.read(|state| state.raffle.clone()).await
    }
}

use chrono::{DateTime, Utc};

use super::{user_entry, Database};
use crate::{
    error::{EngineError, Precondition},
    models::UserRecord,
    rank::{compute_rank, RankChange},
    shop::{self, CosmeticSlot, ItemKind},
};

#[derive(Debug, Clone, Serialize)]
pub struct AwardOutcome {
    pub new_balance: u64,
    pub rank_change: Option<RankChange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimOutcome {
    pub awarded: u64,
    pub streak: u32,
    pub rank_change: Option<RankChange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrestigeOutcome {
    pub prestige_tier: u32,
    pub rank_change: Option<RankChange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutcome {
    pub item_id: String,
    pub new_balance: u64,
    /// Spender and gift recipient can both cross a threshold.
    pub rank_changes: Vec<RankChange>,
}

impl Database {
    pub async fn award_points(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        amount: i64,
    ) -> Result<AwardOutcome, EngineError> {
        if user_id.is_empty() {
            return Err(EngineError::invalid("user id must not be empty"));
        }
        if amount < 1 {
            return Err(EngineError::invalid(format!(
                "award amount must be positive, got {}",
                amount
            )));
        }
        let user_id = user_id.to_string();
        let display_name = display_name.map(str::to_string);
        self.mutate(move |state| {
            let user = user_entry(state, &user_id);
            if let Some(name) = display_name {
                user.display_name = Some(name);
            }
            let rank_change = credit(user, amount as u64);
            Ok(AwardOutcome {
                new_balance: user.points,
                rank_change,
            })
        })
        .await
    }

    /// Negative deltas clamp at zero and never touch the lifetime total.
    pub async fn adjust_points(
        &self,
        user_id: &str,
        delta: i64,
    ) -> Result<AwardOutcome, EngineError> {
        if delta == 0 {
            return Err(EngineError::invalid("adjustment delta must not be zero"));
        }
        let user_id = user_id.to_string();
        self.mutate(move |state| {
            let user = state
                .users
                .users
                .get_mut(&user_id)
                .ok_or_else(|| EngineError::NotFound(format!("user {}", user_id)))?;
            let rank_change = if delta > 0 {
                credit(user, delta as u64)
            } else {
                user.points = user.points.saturating_sub(delta.unsigned_abs());
                recompute_rank(user)
            };
            Ok(AwardOutcome {
                new_balance: user.points,
                rank_change,
            })
        })
        .await
    }

    /// One claim per calendar day, not per rolling 24-hour window: claiming
    /// at 23:59 and again at 00:01 is legal and keeps the streak.
    pub async fn claim_daily(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, EngineError> {
        if user_id.is_empty() {
            return Err(EngineError::invalid("user id must not be empty"));
        }
        let base = self.tuning.daily_base;
        let bonus = self.tuning.daily_streak_bonus;
        let user_id = user_id.to_string();
        self.mutate(move |state| {
            let user = user_entry(state, &user_id);
            match user.last_daily_claim {
                Some(last) if last.date_naive() == now.date_naive() => {
                    return Err(Precondition::AlreadyClaimedToday.into());
                }
                // Exactly the next calendar day keeps the streak alive.
                Some(last) if last.date_naive().succ_opt() == Some(now.date_naive()) => {
                    user.streak_count += 1;
                }
                _ => user.streak_count = 1,
            }
            let awarded = base + user.streak_count as u64 * bonus;
            let rank_change = credit(user, awarded);
            user.last_daily_claim = Some(now);
            Ok(ClaimOutcome {
                awarded,
                streak: user.streak_count,
                rank_change,
            })
        })
        .await
    }

    /// One-way reset: zeroes the balance in exchange for a permanent tier
    /// marker. Lifetime total and streak stay.
    pub async fn prestige(&self, user_id: &str) -> Result<PrestigeOutcome, EngineError> {
        let threshold = self.tuning.prestige_threshold;
        let user_id = user_id.to_string();
        self.mutate(move |state| {
            let user = state
                .users
                .users
                .get_mut(&user_id)
                .ok_or_else(|| EngineError::NotFound(format!("user {}", user_id)))?;
            if user.points < threshold {
                return Err(Precondition::InsufficientPoints {
                    needed: threshold,
                    available: user.points,
                }
                .into());
            }
            user.points = 0;
            user.prestige_tier += 1;
            let rank_change = recompute_rank(user);
            Ok(PrestigeOutcome {
                prestige_tier: user.prestige_tier,
                rank_change,
            })
        })
        .await
    }

    /// Pool-contribution items feed the raffle pool with their cost; gift
    /// margins are burned instead.
    pub async fn purchase(
        &self,
        user_id: &str,
        item_id: &str,
        recipient: Option<&str>,
    ) -> Result<PurchaseOutcome, EngineError> {
        if user_id.is_empty() {
            return Err(EngineError::invalid("user id must not be empty"));
        }
        let item = *shop::find_item(item_id)
            .ok_or_else(|| EngineError::NotFound(format!("item {}", item_id)))?;

        let recipient = match item.kind {
            ItemKind::Gift { .. } => match recipient {
                Some(r) if r == user_id => {
                    return Err(EngineError::invalid("a gift needs somebody else to receive it"));
                }
                Some(r) if !r.is_empty() => Some(r.to_string()),
                _ => return Err(EngineError::invalid("gift items need a recipient")),
            },
            _ => None,
        };

        let user_id = user_id.to_string();
        self.mutate(move |state| {
            let available = state
                .users
                .users
                .get(&user_id)
                .map(|u| u.points)
                .unwrap_or(0);
            if available < item.cost {
                return Err(Precondition::InsufficientPoints {
                    needed: item.cost,
                    available,
                }
                .into());
            }

            let mut rank_changes = Vec::new();
            let new_balance = {
                let buyer = user_entry(state, &user_id);
                buyer.points -= item.cost;
                rank_changes.extend(recompute_rank(buyer));
                buyer.points
            };

            match item.kind {
                ItemKind::Cosmetic { slot, value } => {
                    let buyer = user_entry(state, &user_id);
                    let slot = match slot {
                        CosmeticSlot::Icon => &mut buyer.cosmetics.icon,
                        CosmeticSlot::Flair => &mut buyer.cosmetics.flair,
                        CosmeticSlot::Color => &mut buyer.cosmetics.color,
                    };
                    *slot = Some(value.to_string());
                }
                ItemKind::RaffleTicket => {
                    state.raffle.ticket_holders.push(user_id.clone());
                }
                ItemKind::Gift { gift_amount } => {
                    // Guaranteed Some by the validation above.
                    if let Some(receiver_id) = &recipient {
                        let receiver = user_entry(state, receiver_id);
                        rank_changes.extend(credit(receiver, gift_amount));
                    }
                }
            }

            if item.pool_contribution {
                state.raffle.pool_amount += item.cost;
            }

            Ok(PurchaseOutcome {
                item_id: item.id.to_string(),
                new_balance,
                rank_changes,
            })
        })
        .await
    }

    pub async fn get_user(&self, user_id: &str) -> Option<UserRecord> {
        self.read(|state| state.users.users.get(user_id).cloned()).await
    }

    pub async fn leaderboard(&self, n: usize) -> Vec<UserRecord> {
        self.read(|state| {
            let mut users: Vec<UserRecord> = state.users.users.values().cloned().collect();
            users.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.id.cmp(&b.id)));
            users.truncate(n);
            users
        })
        .await
    }
}

/// Adds earned Vibe to balance and lifetime total.
pub(crate) fn credit(user: &mut UserRecord, amount: u64) -> Option<RankChange> {
    user.points += amount;
    user.total_points_earned += amount;
    recompute_rank(user)
}

pub(crate) fn recompute_rank(user: &mut UserRecord) -> Option<RankChange> {
    let new_rank = compute_rank(user.points);
    if new_rank == user.rank {
        return None;
    }
    let change = RankChange {
        user_id: user.id.clone(),
        old_rank: std::mem::replace(&mut user.rank, new_rank.to_string()),
        new_rank: new_rank.to_string(),
    };
    Some(change)
}

//! Translates raw gateway facts (messages, joins, leaves) into engine
//! operations.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tokio::sync::Mutex;

use crate::{
    database::Database,
    error::EngineError,
    models::{ActionKind, ModerationEntry},
    rank::RankChange,
};

pub const PASSIVE_AWARD_COOLDOWN_SECS: i64 = 15;

#[derive(Debug)]
pub enum JoinCheck {
    Welcomed,
    /// The identity holds a permanent ban. The gateway re-enforces it and
    /// then calls [`EventHandler::confirm_reban`].
    BannedEvader { original_ban: ModerationEntry },
}

pub struct EventHandler {
    db: Arc<Database>,
    last_award: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl EventHandler {
    pub fn new(db: Arc<Database>) -> Self {
        EventHandler {
            db,
            last_award: Mutex::new(HashMap::new()),
        }
    }

    /// Counts the message and rolls a 1-3 Vibe passive award unless the
    /// author is on cooldown.
    pub async fn on_message(
        &self,
        user_id: &str,
        channel_id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RankChange>, EngineError> {
        self.db.record_channel_message(channel_id, now).await?;

        {
            let mut last_award = self.last_award.lock().await;
            if let Some(last) = last_award.get(user_id) {
                if now - *last < Duration::seconds(PASSIVE_AWARD_COOLDOWN_SECS) {
                    return Ok(None);
                }
            }
            last_award.insert(user_id.to_string(), now);
        }

        let amount = rand::thread_rng().gen_range(1..=3);
        let outcome = self
            .db
            .award_points(user_id, Some(display_name), amount)
            .await?;
        if let Some(change) = &outcome.rank_change {
            info!(
                "{} is moving up the block: {} -> {}",
                user_id, change.old_rank, change.new_rank
            );
        }
        Ok(outcome.rank_change)
    }

    /// Counts the join and answers the ban-evasion question. The lock is not
    /// held across the gateway's enforcement, so a concurrent reader may
    /// briefly miss the eventual AUTO_REBAN entry.
    pub async fn on_member_join(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<JoinCheck, EngineError> {
        self.db.record_member_join(now).await?;
        match self.db.find_ban(user_id).await {
            Some(original_ban) => {
                warn!(
                    "Ban evasion alert: {} rejoined but holds a permanent ban from {}",
                    user_id, original_ban.timestamp
                );
                Ok(JoinCheck::BannedEvader { original_ban })
            }
            None => Ok(JoinCheck::Welcomed),
        }
    }

    /// Records the AUTO_REBAN after the gateway confirmed the enforcement
    /// happened.
    pub async fn confirm_reban(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ModerationEntry, EngineError> {
        let reason = match self.db.find_ban(user_id).await {
            Some(ban) => format!("Attempted ban evasion (original ban: {})", ban.reason),
            None => "Attempted ban evasion".to_string(),
        };
        self.db
            .record_action(user_id, "system", ActionKind::AutoReban, reason, now)
            .await
    }

    pub async fn on_member_leave(
        &self,
        _user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        self.db.record_member_leave(now).await
    }
}

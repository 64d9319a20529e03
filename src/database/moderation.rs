use chrono::{DateTime, Datelike, Utc};

use super::Database;
use crate::{
    error::{EngineError, Precondition},
    models::{ActionKind, ModerationEntry},
};

impl Database {
    /// Appends a disciplinary action to the ledger and bumps the current
    /// month's total for its kind. Entries are permanent: there is no edit or
    /// delete path anywhere in the engine.
    ///
    /// An `AUTO_REBAN` is only accepted when an earlier `BAN` exists for the
    /// same target, so the ledger can never claim an enforcement that had no
    /// ban behind it.
    pub async fn record_action<S: Into<String>>(
        &self,
        target_id: &str,
        actor_id: &str,
        action: ActionKind,
        reason: S,
        now: DateTime<Utc>,
    ) -> Result<ModerationEntry, EngineError> {
        if target_id.is_empty() {
            return Err(EngineError::invalid("target id must not be empty"));
        }
        if actor_id.is_empty() {
            return Err(EngineError::invalid("actor id must not be empty"));
        }
        let reason = reason.into();

        let target = target_id.to_string();
        let actor = actor_id.to_string();
        self.mutate(move |state| {
            if action == ActionKind::AutoReban
                && !state
                    .mod_log
                    .entries
                    .iter()
                    .any(|e| e.action == ActionKind::Ban && e.target_id == target)
            {
                return Err(Precondition::RebanWithoutBan(target).into());
            }

            // Monthly rollover before counting.
            let month = format!("{:04}-{:02}", now.year(), now.month());
            if state.counters.month != month {
                state.counters.month = month;
                state.counters.action_totals.clear();
            }
            *state.counters.action_totals.entry(action).or_insert(0) += 1;

            let entry = ModerationEntry {
                target_id: target,
                actor_id: actor,
                action,
                reason,
                timestamp: now,
            };
            state.mod_log.entries.push(entry.clone());
            Ok(entry)
        })
        .await
    }

    /// A ban is permanent once issued; there is no unban action by design, so
    /// any `BAN` entry on record means the identity stays out.
    pub async fn is_banned(&self, target_id: &str) -> bool {
        self.find_ban(target_id).await.is_some()
    }

    /// Most recent `BAN` entry for the target, if any. The event shim uses it
    /// to reference the original reason in the `AUTO_REBAN` record.
    pub async fn find_ban(&self, target_id: &str) -> Option<ModerationEntry> {
        self.read(|state| {
            state
                .mod_log
                .entries
                .iter()
                .rev()
                .find(|e| e.action == ActionKind::Ban && e.target_id == target_id)
                .cloned()
        })
        .await
    }

    /// Full disciplinary history of one target, newest first. Taken under the
    /// lock, so the scan never observes a partial write.
    pub async fn find_by_target(&self, target_id: &str) -> Vec<ModerationEntry> {
        self.read(|state| {
            state
                .mod_log
                .entries
                .iter()
                .rev()
                .filter(|e| e.target_id == target_id)
                .cloned()
                .collect()
        })
        .await
    }

    /// Last `n` ledger entries, newest first, for the dashboard summary.
    pub async fn recent_entries(&self, n: usize) -> Vec<ModerationEntry> {
        self.read(|state| state.mod_log.entries.iter().rev().take(n).cloned().collect())
            .await
    }

    pub async fn total_entries(&self) -> usize {
        self.read(|state| state.mod_log.entries.len()).await
    }
}

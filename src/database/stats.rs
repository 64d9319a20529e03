use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::Database;
use crate::error::EngineError;
use crate::models::ActionKind;

/// Rolling activity aggregates for the dashboard. A pure function of the
/// stored counters; nothing correctness-critical reads from here.
#[derive(Debug, Clone, Serialize)]
pub struct ActivitySummary {
    pub joins_7d: u64,
    pub leaves_7d: u64,
    pub joins_30d: u64,
    pub leaves_30d: u64,
    /// `leaves / joins * 100` over 30 days; 0 when there were no joins.
    pub churn_rate_30d: f64,
    /// Busiest channels by 30-day message count, descending.
    pub top_channels: Vec<ChannelActivity>,
    pub month: String,
    pub action_totals: HashMap<ActionKind, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelActivity {
    pub channel_id: String,
    pub messages: u64,
}

impl Database {
    pub async fn record_member_join(&self, now: DateTime<Utc>) -> Result<(), EngineError> {
        self.mutate(move |state| {
            state.counters.days.entry(now.date_naive()).or_default().joins += 1;
            Ok(())
        })
        .await
    }

    pub async fn record_member_leave(&self, now: DateTime<Utc>) -> Result<(), EngineError> {
        self.mutate(move |state| {
            state.counters.days.entry(now.date_naive()).or_default().leaves += 1;
            Ok(())
        })
        .await
    }

    pub async fn record_channel_message(
        &self,
        channel_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if channel_id.is_empty() {
            return Err(EngineError::invalid("channel id must not be empty"));
        }
        let channel_id = channel_id.to_string();
        self.mutate(move |state| {
            *state
                .counters
                .days
                .entry(now.date_naive())
                .or_default()
                .channel_messages
                .entry(channel_id)
                .or_insert(0) += 1;
            Ok(())
        })
        .await
    }

    pub async fn activity_summary(&self, now: DateTime<Utc>, top_n: usize) -> ActivitySummary {
        self.read(|state| {
            let today = now.date_naive();
            let window = |days: i64| today - Duration::days(days - 1);

            let mut joins_7d = 0;
            let mut leaves_7d = 0;
            let mut joins_30d = 0;
            let mut leaves_30d = 0;
            let mut channels: HashMap<String, u64> = HashMap::new();

            for (date, day) in state.counters.days.range(window(30)..=today) {
                joins_30d += day.joins;
                leaves_30d += day.leaves;
                if *date >= window(7) {
                    joins_7d += day.joins;
                    leaves_7d += day.leaves;
                }
                for (channel, count) in &day.channel_messages {
                    *channels.entry(channel.clone()).or_insert(0) += count;
                }
            }

            let churn_rate_30d = if joins_30d == 0 {
                0.0
            } else {
                leaves_30d as f64 / joins_30d as f64 * 100.0
            };

            let mut top_channels: Vec<ChannelActivity> = channels
                .into_iter()
                .map(|(channel_id, messages)| ChannelActivity {
                    channel_id,
                    messages,
                })
                .collect();
            top_channels.sort_by(|a, b| {
                b.messages
                    .cmp(&a.messages)
                    .then_with(|| a.channel_id.cmp(&b.channel_id))
            });
            top_channels.truncate(top_n);

            ActivitySummary {
                joins_7d,
                leaves_7d,
                joins_30d,
                leaves_30d,
                churn_rate_30d,
                top_channels,
                month: state.counters.month.clone(),
                action_totals: state.counters.action_totals.clone(),
            }
        })
        .await
    }
}

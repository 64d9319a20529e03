use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};

/// Bumped whenever a persisted document gains fields. Old documents load fine
/// regardless because every field carries a serde default; the version is kept
/// so offline tooling can tell generations apart.
pub const SCHEMA_VERSION: u32 = 1;

fn schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One community member. Created lazily on first observed activity and never
/// deleted, so ban-evasion checks keep working after a member leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    /// Last display name we saw, kept for leaderboards and the dashboard.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Spendable Vibe balance.
    #[serde(default)]
    pub points: u64,
    /// Lifetime Vibe earned; never reduced by spending or prestige.
    #[serde(default)]
    pub total_points_earned: u64,
    /// Display cache only; the authoritative rank is derived from `points`.
    #[serde(default)]
    pub rank: String,
    /// Consecutive daily claims. 0 means never claimed.
    #[serde(default)]
    pub streak_count: u32,
    #[serde(default)]
    pub last_daily_claim: Option<DateTime<Utc>>,
    /// Completed prestige resets.
    #[serde(default)]
    pub prestige_tier: u32,
    #[serde(default)]
    pub cosmetics: Cosmetics,
}

impl UserRecord {
    pub fn new<S: Into<String>>(id: S) -> Self {
        UserRecord {
            id: id.into(),
            display_name: None,
            points: 0,
            total_points_earned: 0,
            rank: crate::rank::compute_rank(0).to_string(),
            streak_count: 0,
            last_daily_claim: None,
            prestige_tier: 0,
            cosmetics: Cosmetics::default(),
        }
    }
}

/// Purchased display attributes. Data only, no behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cosmetics {
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub flair: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Warn,
    Mute,
    Unmute,
    Kick,
    Ban,
    AutoReban,
    Report,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActionKind::Warn => "WARN",
            ActionKind::Mute => "MUTE",
            ActionKind::Unmute => "UNMUTE",
            ActionKind::Kick => "KICK",
            ActionKind::Ban => "BAN",
            ActionKind::AutoReban => "AUTO_REBAN",
            ActionKind::Report => "REPORT",
        };
        f.write_str(s)
    }
}

/// One disciplinary action. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationEntry {
    pub target_id: String,
    /// Moderator user id, or `"system"` for automatic actions.
    pub actor_id: String,
    pub action: ActionKind,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// The shared prize accumulator, funded by shop sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RafflePool {
    #[serde(default = "schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub pool_amount: u64,
    /// Multiset: one element per ticket, so more tickets mean better odds.
    #[serde(default)]
    pub ticket_holders: Vec<String>,
}

impl Default for RafflePool {
    fn default() -> Self {
        RafflePool {
            schema_version: SCHEMA_VERSION,
            pool_amount: 0,
            ticket_holders: Vec::new(),
        }
    }
}

/// Daily and monthly aggregates, for reporting only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodCounters {
    #[serde(default = "schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub days: BTreeMap<NaiveDate, DayCounters>,
    /// `YYYY-MM` the action totals below belong to. A new month zeroes them.
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub action_totals: HashMap<ActionKind, u64>,
}

impl Default for PeriodCounters {
    fn default() -> Self {
        PeriodCounters {
            schema_version: SCHEMA_VERSION,
            days: BTreeMap::new(),
            month: String::new(),
            action_totals: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayCounters {
    #[serde(default)]
    pub joins: u64,
    #[serde(default)]
    pub leaves: u64,
    #[serde(default)]
    pub channel_messages: HashMap<String, u64>,
}

/// Document wrapper for the user collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersDoc {
    #[serde(default = "schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub users: BTreeMap<String, UserRecord>,
}

impl Default for UsersDoc {
    fn default() -> Self {
        UsersDoc {
            schema_version: SCHEMA_VERSION,
            users: BTreeMap::new(),
        }
    }
}

/// Document wrapper for the moderation ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModLogDoc {
    #[serde(default = "schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub entries: Vec<ModerationEntry>,
}

impl Default for ModLogDoc {
    fn default() -> Self {
        ModLogDoc {
            schema_version: SCHEMA_VERSION,
            entries: Vec::new(),
        }
    }
}

/// The entire in-memory state. Cloned under the lock to hand a consistent
/// snapshot to the persistence adapter and to readers.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub users: UsersDoc,
    pub mod_log: ModLogDoc,
    pub raffle: RafflePool,
    pub counters: PeriodCounters,
}

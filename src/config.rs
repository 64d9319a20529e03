use std::{env, path::PathBuf};

/// Runtime configuration, sourced from the environment (with `.env` support
/// through dotenv). Every knob has a default so the bot comes up on a bare
/// machine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the JSON data documents.
    pub data_dir: PathBuf,
    /// Address the admin/read API binds to.
    pub bind_addr: String,
    /// Token expected in `X-Admin-Token` for admin routes. When unset the
    /// admin routes fail closed.
    pub admin_token: Option<String>,
    pub tuning: Tuning,
}

/// Economy tuning knobs. Kept separate from `Config` so the engine can be
/// constructed in tests without touching the environment.
#[derive(Debug, Clone)]
pub struct Tuning {
    /// Base Vibe awarded by a daily claim.
    pub daily_base: u64,
    /// Extra Vibe per consecutive-day streak.
    pub daily_streak_bonus: u64,
    /// Vibe required before a prestige reset is allowed.
    pub prestige_threshold: u64,
    /// The raffle refuses to draw below this pool amount.
    pub raffle_minimum_pool: u64,
    /// Prize cap; anything above rolls over into the next pool.
    pub raffle_maximum_pool: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            daily_base: 50,
            daily_streak_bonus: 10,
            prestige_threshold: 10_000,
            raffle_minimum_pool: 10_000,
            raffle_maximum_pool: 35_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Config {
        let defaults = Tuning::default();
        Config {
            data_dir: env::var("RYKER_DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .into(),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "localhost:8080".to_string()),
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            tuning: Tuning {
                daily_base: env_u64("DAILY_BASE", defaults.daily_base),
                daily_streak_bonus: env_u64("DAILY_STREAK_BONUS", defaults.daily_streak_bonus),
                prestige_threshold: env_u64("PRESTIGE_THRESHOLD", defaults.prestige_threshold),
                raffle_minimum_pool: env_u64("RAFFLE_MINIMUM_POOL", defaults.raffle_minimum_pool),
                raffle_maximum_pool: env_u64("RAFFLE_MAXIMUM_POOL", defaults.raffle_maximum_pool),
            },
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("Invalid {} value {:?}, using default {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

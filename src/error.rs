use thiserror::Error;

/// Errors surfaced by the state engine.
///
/// `PreconditionFailed` is a normal, expected outcome (already claimed today,
/// not enough Vibe, ...) meant for user-facing messaging; callers should not
/// log it as an error. `Persistence` never escapes a mutation: a failed save
/// keeps the in-memory state authoritative and is retried by the flush timer.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    PreconditionFailed(#[from] Precondition),
    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Precondition {
    #[error("the daily reward was already claimed today")]
    AlreadyClaimedToday,
    #[error("not enough Vibe: need {needed}, have {available}")]
    InsufficientPoints { needed: u64, available: u64 },
    #[error("prize pool {pool} is below the minimum of {minimum}")]
    PoolBelowMinimum { pool: u64, minimum: u64 },
    #[error("nobody holds a raffle ticket")]
    NoTickets,
    #[error("no BAN on record for {0}, refusing to log AUTO_REBAN")]
    RebanWithoutBan(String),
}

impl EngineError {
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        EngineError::InvalidArgument(msg.into())
    }
}

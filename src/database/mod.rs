//! The shared state engine. Every mutation from the event processor and the
//! web interface goes through one exclusive critical section around the
//! in-memory [`State`]; reads clone a consistent snapshot under the same lock,
//! so a multi-record mutation (a gift touching two users) can never be
//! observed half-applied.
//!
//! Persistence is triggered after each mutation against a snapshot taken under
//! the lock, with the actual file I/O happening outside it. A failed save
//! never fails the mutation: the in-memory state stays authoritative, the
//! store is marked dirty and the scheduled flush retries.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use tokio::sync::Mutex;

use crate::{
    config::Tuning,
    error::EngineError,
    models::{State, UserRecord},
    persistence::Store,
    rank::compute_rank,
};

pub mod economy;
pub mod moderation;
pub mod raffle;
pub mod stats;

pub struct Database {
    state: Mutex<State>,
    store: Arc<Store>,
    tuning: Tuning,
    /// Snapshot sequence, taken under the state lock so it orders saves the
    /// same way the mutations happened.
    save_seq: AtomicU64,
    dirty: AtomicBool,
}

impl Database {
    /// Opens the store and loads the last saved snapshot. Unreadable documents
    /// fall back to defaults inside the store (with a loud warning); only a
    /// data directory that cannot be created is fatal.
    pub fn open<P: Into<std::path::PathBuf>>(dir: P, tuning: Tuning) -> anyhow::Result<Database> {
        let store = Store::new(dir)?;
        let mut state = store.load();

        // Backfill derived fields into records written by older versions.
        for user in state.users.users.values_mut() {
            user.rank = compute_rank(user.points).to_string();
            if user.total_points_earned < user.points {
                user.total_points_earned = user.points;
            }
        }

        info!(
            "Loaded state: {} users, {} moderation entries, raffle pool at {}",
            state.users.users.len(),
            state.mod_log.entries.len(),
            state.raffle.pool_amount
        );

        Ok(Database {
            state: Mutex::new(state),
            store: Arc::new(store),
            tuning,
            save_seq: AtomicU64::new(0),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Runs `f` inside the critical section and saves the resulting snapshot.
    /// `f` must do all its validation before touching the state so a rejected
    /// operation leaves no trace.
    pub(crate) async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut State) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let (out, snapshot, seq) = {
            let mut state = self.state.lock().await;
            let out = f(&mut state)?;
            let seq = self.save_seq.fetch_add(1, Ordering::SeqCst) + 1;
            (out, state.clone(), seq)
        };
        self.persist(snapshot, seq).await;
        Ok(out)
    }

    /// Runs a read-only `f` against a consistent view of the state.
    pub(crate) async fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        let state = self.state.lock().await;
        f(&state)
    }

    /// Full consistent snapshot, for the web interface and tests.
    pub async fn snapshot(&self) -> State {
        self.state.lock().await.clone()
    }

    /// Retries a save that previously failed. Called on a timer and once more
    /// on shutdown.
    pub async fn flush(&self) {
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return;
        }
        let (snapshot, seq) = {
            let state = self.state.lock().await;
            let seq = self.save_seq.fetch_add(1, Ordering::SeqCst) + 1;
            (state.clone(), seq)
        };
        self.persist(snapshot, seq).await;
    }

    /// File I/O runs on the blocking pool so mutations never stall the
    /// runtime on disk writes.
    async fn persist(&self, snapshot: State, seq: u64) {
        let store = self.store.clone();
        let saved = tokio::task::spawn_blocking(move || store.save(&snapshot, seq)).await;
        match saved {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Saving state failed, will retry on the next flush: {:#}", e);
                self.dirty.store(true, Ordering::SeqCst);
            }
            Err(e) => {
                warn!("Save task failed, will retry on the next flush: {}", e);
                self.dirty.store(true, Ordering::SeqCst);
            }
        }
    }
}

/// Fetches a user, creating the record lazily on first observed activity.
pub(crate) fn user_entry<'a>(state: &'a mut State, user_id: &str) -> &'a mut UserRecord {
    state
        .users
        .users
        .entry(user_id.to_string())
        .or_insert_with(|| UserRecord::new(user_id))
}

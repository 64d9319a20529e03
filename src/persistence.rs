//! Durable load/save of the engine state: one pretty-printed JSON document per
//! collection, safe to inspect or edit while the process is down.
//!
//! Writes go through a temp file and an atomic rename, keeping the previous
//! version aside as `<name>.prev`. A document that fails to parse on load is
//! moved aside as `<name>.corrupt` and replaced with defaults; the data is
//! never silently discarded.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{ModLogDoc, PeriodCounters, RafflePool, State, UsersDoc};

const USERS_FILE: &str = "vibe_data.json";
const MOD_LOGS_FILE: &str = "mod_logs.json";
const RAFFLE_FILE: &str = "raffle_pool.json";
const METRICS_FILE: &str = "metrics.json";

pub struct Store {
    dir: PathBuf,
    /// Sequence number of the newest snapshot on disk. Saves lock it for the
    /// whole write, so concurrent savers never interleave temp files and an
    /// older snapshot can never overwrite a newer one.
    saved_seq: Mutex<u64>,
}

impl Store {
    pub fn new<P: Into<PathBuf>>(dir: P) -> anyhow::Result<Store> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating data directory {}", dir.display()))?;
        Ok(Store {
            dir,
            saved_seq: Mutex::new(0),
        })
    }

    /// Loads the last durably saved snapshot. Missing files mean a fresh
    /// start; unreadable ones are preserved aside and replaced with defaults.
    pub fn load(&self) -> State {
        State {
            users: self.load_doc::<UsersDoc>(USERS_FILE),
            mod_log: self.load_doc::<ModLogDoc>(MOD_LOGS_FILE),
            raffle: self.load_doc::<RafflePool>(RAFFLE_FILE),
            counters: self.load_doc::<PeriodCounters>(METRICS_FILE),
        }
    }

    /// Saves the snapshot tagged with sequence number `seq`. A snapshot older
    /// than what is already on disk is skipped.
    pub fn save(&self, state: &State, seq: u64) -> anyhow::Result<()> {
        let mut saved = self
            .saved_seq
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if seq <= *saved {
            return Ok(());
        }
        self.save_doc(USERS_FILE, &state.users)?;
        self.save_doc(MOD_LOGS_FILE, &state.mod_log)?;
        self.save_doc(RAFFLE_FILE, &state.raffle)?;
        self.save_doc(METRICS_FILE, &state.counters)?;
        *saved = seq;
        Ok(())
    }

    fn load_doc<T: Default + DeserializeOwned>(&self, file: &str) -> T {
        let path = self.dir.join(file);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(e) => {
                warn!("Could not read {}: {}. Starting with an empty document", file, e);
                return T::default();
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(
                    "Could not parse {}: {}. The file is kept as {}.corrupt and an empty document takes its place",
                    file, e, file
                );
                let _ = fs::rename(&path, corrupt_path(&path));
                T::default()
            }
        }
    }

    fn save_doc<T: Serialize>(&self, file: &str, doc: &T) -> anyhow::Result<()> {
        let path = self.dir.join(file);
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_vec_pretty(doc).with_context(|| format!("serializing {}", file))?;
        {
            let mut f = fs::File::create(&tmp_path)
                .with_context(|| format!("creating {}", tmp_path.display()))?;
            f.write_all(&json)?;
            f.sync_all()?;
        }

        // Keep one previous version around for manual recovery.
        if path.exists() {
            let _ = fs::rename(&path, path.with_extension("json.prev"));
        }
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("moving {} into place", path.display()))?;
        Ok(())
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    path.with_extension("json.corrupt")
}

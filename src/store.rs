use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::match_record::MatchRecord;

const CANCEL_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId {
    pub version: u64,
    pub fingerprint: String,
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.fingerprint.get(..12).unwrap_or(&self.fingerprint);
        write!(f, "v{}-{}", self.version, short)
    }
}

#[derive(Debug, Clone)]
pub struct MatchRecordStore {
    records: Vec<MatchRecord>,
    id: SnapshotId,
}

impl MatchRecordStore {
    pub fn new(records: Vec<MatchRecord>) -> Self {
        Self::with_version(records, 0)
    }

    pub fn with_version(mut records: Vec<MatchRecord>, version: u64) -> Self {
        records.sort_by_key(|m| m.date);
        let fingerprint = fingerprint(&records);
        Self {
            records,
            id: SnapshotId {
                version,
                fingerprint,
            },
        }
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn id(&self) -> &SnapshotId {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.id.version
    }

    pub fn matches_for<'a>(&'a self, team: &'a str) -> impl Iterator<Item = &'a MatchRecord> + 'a {
        self.records.iter().filter(move |m| m.involves(team))
    }

    pub fn contains_team(&self, team: &str) -> bool {
        self.records.iter().any(|m| m.involves(team))
    }

    pub fn teams(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for m in &self.records {
            names.insert(m.home_team.as_str());
            names.insert(m.away_team.as_str());
        }
        names.into_iter().map(str::to_string).collect()
    }
}

fn fingerprint(records: &[MatchRecord]) -> String {
    let mut hasher = Sha256::new();
    for m in records {
        hasher.update(m.date.to_string().as_bytes());
        hasher.update([0]);
        hasher.update(m.home_team.as_bytes());
        hasher.update([0]);
        hasher.update(m.away_team.as_bytes());
        hasher.update([0, m.home_goals, m.away_goals, m.result.code() as u8]);
        for side in [&m.home, &m.away] {
            for v in [side.corners, side.fouls, side.yellow_cards, side.red_cards] {
                hasher.update(v.map_or(u32::MAX, u32::from).to_le_bytes());
            }
        }
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("dataset refresh timed out after {0:?}")]
    TimedOut(Duration),
    #[error("dataset refresh cancelled")]
    Cancelled,
    #[error("dataset refresh produced no matches")]
    Empty,
    #[error("dataset loader failed: {0}")]
    Loader(anyhow::Error),
}

#[derive(Debug)]
pub struct SnapshotCell {
    current: RwLock<Arc<MatchRecordStore>>,
}

impl SnapshotCell {
    pub fn new(store: MatchRecordStore) -> Self {
        Self {
            current: RwLock::new(Arc::new(store)),
        }
    }

    pub fn snapshot(&self) -> Arc<MatchRecordStore> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn replace(&self, records: Vec<MatchRecord>) -> Arc<MatchRecordStore> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let next = Arc::new(MatchRecordStore::with_version(
            records,
            guard.version() + 1,
        ));
        *guard = Arc::clone(&next);
        info!(snapshot = %next.id(), matches = next.len(), "dataset snapshot swapped");
        next
    }

    /// Runs `loader` on a worker thread and swaps in its records if it finishes
    /// within `timeout` and nobody cancelled `cancel` in the meantime.
    ///
    /// On timeout the token is cancelled so a cooperative loader can stop early.
    pub fn refresh<F>(
        &self,
        timeout: Duration,
        cancel: &CancelToken,
        loader: F,
    ) -> Result<Arc<MatchRecordStore>, RefreshError>
    where
        F: FnOnce(CancelToken) -> anyhow::Result<Vec<MatchRecord>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker_token = cancel.clone();
        thread::Builder::new()
            .name("dataset-refresh".to_string())
            .spawn(move || {
                let _ = tx.send(loader(worker_token));
            })
            .map_err(|e| RefreshError::Loader(anyhow!("spawn refresh worker: {e}")))?;

        let deadline = Instant::now() + timeout;
        let outcome = loop {
            if cancel.is_cancelled() {
                warn!("dataset refresh cancelled; keeping current snapshot");
                return Err(RefreshError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                cancel.cancel();
                warn!(?timeout, "dataset refresh timed out; keeping current snapshot");
                return Err(RefreshError::TimedOut(timeout));
            }
            match rx.recv_timeout(CANCEL_POLL.min(deadline - now)) {
                Ok(outcome) => break outcome,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(RefreshError::Loader(anyhow!(
                        "refresh worker exited without a result"
                    )));
                }
            }
        };

        if cancel.is_cancelled() {
            return Err(RefreshError::Cancelled);
        }
        let records = outcome.map_err(|e| {
            warn!(error = %e, "dataset refresh failed; keeping current snapshot");
            RefreshError::Loader(e)
        })?;
        if records.is_empty() {
            return Err(RefreshError::Empty);
        }
        Ok(self.replace(records))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn rec(day: u32, home: &str, away: &str, hg: u8, ag: u8) -> MatchRecord {
        let date = NaiveDate::from_ymd_opt(2024, 9, day).unwrap();
        MatchRecord::new(date, home, away, hg, ag)
    }

    #[test]
    fn store_sorts_by_date_and_lists_teams() {
        let store = MatchRecordStore::new(vec![
            rec(20, "Porto", "Braga", 2, 0),
            rec(3, "Benfica", "Porto", 1, 1),
        ]);
        assert_eq!(store.records()[0].date.to_string(), "2024-09-03");
        assert_eq!(store.teams(), vec!["Benfica", "Braga", "Porto"]);
        assert_eq!(store.matches_for("Porto").count(), 2);
        assert!(!store.contains_team("Sporting"));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = MatchRecordStore::new(vec![rec(1, "Porto", "Braga", 2, 0)]);
        let b = MatchRecordStore::new(vec![rec(1, "Porto", "Braga", 2, 0)]);
        let c = MatchRecordStore::new(vec![rec(1, "Porto", "Braga", 2, 1)]);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id().fingerprint, c.id().fingerprint);
        assert_eq!(a.id().fingerprint.len(), 64);
    }

    #[test]
    fn replace_bumps_version() {
        let cell = SnapshotCell::new(MatchRecordStore::new(Vec::new()));
        let next = cell.replace(vec![rec(1, "Porto", "Braga", 2, 0)]);
        assert_eq!(next.version(), 1);
        assert_eq!(cell.snapshot().len(), 1);
    }
}

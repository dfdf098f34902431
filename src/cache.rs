use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ForecastConfig;
use crate::error::ForecastError;
use crate::forecast::{Forecast, MatchQuery, assemble};
use crate::form::{TeamFormStats, compute_form_with};
use crate::store::{MatchRecordStore, SnapshotId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub forms: usize,
    pub forecasts: usize,
}

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<SnapshotId>,
    forms: HashMap<String, TeamFormStats>,
    forecasts: HashMap<String, Forecast>,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn sync(&mut self, id: &SnapshotId) {
        if self.snapshot.as_ref() == Some(id) {
            return;
        }
        if let Some(prev) = self.snapshot.as_ref() {
            info!(
                from = %prev,
                to = %id,
                forms = self.forms.len(),
                forecasts = self.forecasts.len(),
                "snapshot changed; forecast cache invalidated"
            );
        }
        self.forms.clear();
        self.forecasts.clear();
        self.snapshot = Some(id.clone());
    }
}

#[derive(Debug, Default)]
pub struct ForecastCache {
    state: Mutex<CacheState>,
}

impl ForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.forms.clear();
        state.forecasts.clear();
        state.snapshot = None;
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            forms: state.forms.len(),
            forecasts: state.forecasts.len(),
        }
    }

    pub fn form(
        &self,
        store: &MatchRecordStore,
        team: &str,
        cfg: &ForecastConfig,
    ) -> Result<TeamFormStats, ForecastError> {
        let key = cache_key(&(team, cfg.window_size, &cfg.stat_defaults));
        if let Some(hit) = self.lookup(store.id(), key.as_deref(), |s| &s.forms) {
            return Ok(hit);
        }
        let stats = compute_form_with(team, store, cfg.window_size, &cfg.stat_defaults)?;
        if let Some(key) = key {
            self.store_entry(store.id(), |s| &mut s.forms, key, stats.clone());
        }
        Ok(stats)
    }

    pub fn forecast(
        &self,
        store: &MatchRecordStore,
        query: &MatchQuery,
        cfg: &ForecastConfig,
    ) -> Result<Forecast, ForecastError> {
        cfg.validate()?;
        query.validate()?;
        let key = cache_key(&(query, cfg));
        if let Some(hit) = self.lookup(store.id(), key.as_deref(), |s| &s.forecasts) {
            debug!(home = %query.home_team, away = %query.away_team, "forecast cache hit");
            return Ok(hit);
        }
        let home_form = self.form(store, &query.home_team, cfg)?;
        let away_form = self.form(store, &query.away_team, cfg)?;
        let out = assemble(store, query, cfg, home_form, away_form)?;
        if let Some(key) = key {
            self.store_entry(store.id(), |s| &mut s.forecasts, key, out.clone());
        }
        Ok(out)
    }

    fn lookup<T: Clone>(
        &self,
        id: &SnapshotId,
        key: Option<&str>,
        table: impl Fn(&CacheState) -> &HashMap<String, T>,
    ) -> Option<T> {
        let key = key?;
        let mut state = self.lock();
        state.sync(id);
        let hit = table(&*state).get(key).cloned();
        if hit.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        hit
    }

    fn store_entry<T>(
        &self,
        id: &SnapshotId,
        table: impl Fn(&mut CacheState) -> &mut HashMap<String, T>,
        key: String,
        value: T,
    ) {
        let mut state = self.lock();
        state.sync(id);
        table(&mut *state).insert(key, value);
    }
}

fn cache_key(parts: &impl Serialize) -> Option<String> {
    serde_json::to_string(parts).ok()
}

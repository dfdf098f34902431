use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::error::ForecastError;
use crate::expectations::{MatchExpectations, match_expectations};
use crate::form::{Reliability, TeamFormStats, compute_form_with};
use crate::h2h::{H2HSummary, summarize};
use crate::markets::{MarketReport, derive_markets};
use crate::scoreline::{ExpectedGoals, ScorelineMatrix, TeamAbsences, build_matrix, expected_goals};
use crate::store::{MatchRecordStore, SnapshotId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchQuery {
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_absences: TeamAbsences,
    #[serde(default)]
    pub away_absences: TeamAbsences,
    #[serde(default = "default_true")]
    pub include_h2h: bool,
}

fn default_true() -> bool {
    true
}

impl MatchQuery {
    pub fn new(home_team: impl Into<String>, away_team: impl Into<String>) -> Self {
        Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_absences: TeamAbsences::default(),
            away_absences: TeamAbsences::default(),
            include_h2h: true,
        }
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.home_team.trim().is_empty() || self.away_team.trim().is_empty() {
            return Err(ForecastError::invalid("both team names are required"));
        }
        if self.home_team == self.away_team {
            return Err(ForecastError::invalid(format!(
                "home and away team must differ (got {})",
                self.home_team
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub snapshot: SnapshotId,
    pub home_form: TeamFormStats,
    pub away_form: TeamFormStats,
    pub home_reliability: Reliability,
    pub away_reliability: Reliability,
    pub expected_goals: ExpectedGoals,
    pub matrix: ScorelineMatrix,
    pub markets: MarketReport,
    pub expectations: MatchExpectations,
    pub h2h: Option<H2HSummary>,
}

pub fn forecast(
    store: &MatchRecordStore,
    query: &MatchQuery,
    cfg: &ForecastConfig,
) -> Result<Forecast, ForecastError> {
    cfg.validate()?;
    query.validate()?;
    let home_form = compute_form_with(&query.home_team, store, cfg.window_size, &cfg.stat_defaults)?;
    let away_form = compute_form_with(&query.away_team, store, cfg.window_size, &cfg.stat_defaults)?;
    assemble(store, query, cfg, home_form, away_form)
}

pub(crate) fn assemble(
    store: &MatchRecordStore,
    query: &MatchQuery,
    cfg: &ForecastConfig,
    home_form: TeamFormStats,
    away_form: TeamFormStats,
) -> Result<Forecast, ForecastError> {
    let expected = expected_goals(
        &home_form,
        &away_form,
        query.home_absences,
        query.away_absences,
        cfg,
    );
    let matrix = build_matrix(expected.home, expected.away, cfg.max_goals)?;
    let markets = derive_markets(&matrix, &cfg.over_under_lines);
    let expectations = match_expectations(&home_form, &away_form);
    let h2h = query
        .include_h2h
        .then(|| summarize(&query.home_team, &query.away_team, store, cfg.h2h_limit));

    Ok(Forecast {
        snapshot: store.id().clone(),
        home_reliability: home_form.reliability(cfg.reliability_threshold),
        away_reliability: away_form.reliability(cfg.reliability_threshold),
        home_form,
        away_form,
        expected_goals: expected,
        matrix,
        markets,
        expectations,
        h2h,
    })
}

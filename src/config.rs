use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

pub const MAX_GOALS_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatDefaults {
    pub corners_home: f64,
    pub corners_away: f64,
    pub fouls: f64,
    pub yellow_cards: f64,
    pub red_cards: f64,
}

impl Default for StatDefaults {
    fn default() -> Self {
        Self {
            corners_home: 4.5,
            corners_away: 4.0,
            fouls: 11.5,
            yellow_cards: 2.0,
            red_cards: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub window_size: usize,
    pub max_goals: usize,
    pub over_under_lines: Vec<f64>,
    pub home_advantage_factor: f64,
    pub attack_penalty: f64,
    pub defense_penalty: f64,
    pub reliability_threshold: f64,
    pub h2h_limit: usize,
    pub stat_defaults: StatDefaults,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            max_goals: 6,
            over_under_lines: vec![1.5, 2.5, 3.5],
            home_advantage_factor: 1.10,
            attack_penalty: 0.80,
            defense_penalty: 1.15,
            reliability_threshold: 1.0,
            h2h_limit: 8,
            stat_defaults: StatDefaults::default(),
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.window_size == 0 {
            return Err(ForecastError::invalid("window_size must be at least 1"));
        }
        if self.max_goals == 0 || self.max_goals > MAX_GOALS_LIMIT {
            return Err(ForecastError::invalid(format!(
                "max_goals must be within 1..={MAX_GOALS_LIMIT} (got {})",
                self.max_goals
            )));
        }
        if self.over_under_lines.is_empty() {
            return Err(ForecastError::invalid("at least one over/under line is required"));
        }
        if let Some(bad) = self
            .over_under_lines
            .iter()
            .find(|l| !l.is_finite() || **l < 0.0)
        {
            return Err(ForecastError::invalid(format!(
                "over/under line must be a non-negative number (got {bad})"
            )));
        }
        for (name, v) in [
            ("home_advantage_factor", self.home_advantage_factor),
            ("attack_penalty", self.attack_penalty),
            ("defense_penalty", self.defense_penalty),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(ForecastError::invalid(format!(
                    "{name} must be a positive number (got {v})"
                )));
            }
        }
        if !self.reliability_threshold.is_finite() || self.reliability_threshold < 0.0 {
            return Err(ForecastError::invalid(format!(
                "reliability_threshold must be non-negative (got {})",
                self.reliability_threshold
            )));
        }
        if self.h2h_limit == 0 {
            return Err(ForecastError::invalid("h2h_limit must be at least 1"));
        }
        let d = &self.stat_defaults;
        for v in [
            d.corners_home,
            d.corners_away,
            d.fouls,
            d.yellow_cards,
            d.red_cards,
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ForecastError::invalid(format!(
                    "stat defaults must be non-negative numbers (got {v})"
                )));
            }
        }
        Ok(())
    }

    pub fn from_env() -> Result<Self, ForecastError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ForecastError> {
        let mut cfg = Self::default();
        if let Some(n) = parse_count(&lookup, "APP_WINDOW_SIZE")? {
            cfg.window_size = n;
        }
        if let Some(n) = parse_count(&lookup, "APP_MAX_GOALS")? {
            cfg.max_goals = n;
        }
        if let Some(raw) = non_empty(&lookup, "APP_OVER_UNDER_LINES") {
            cfg.over_under_lines = raw
                .split([',', ';', ' '])
                .filter(|p| !p.trim().is_empty())
                .map(|p| {
                    p.trim().parse::<f64>().map_err(|_| {
                        ForecastError::invalid(format!("APP_OVER_UNDER_LINES: bad value {p:?}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
        }
        if let Some(v) = parse_float(&lookup, "APP_HOME_ADVANTAGE")? {
            cfg.home_advantage_factor = v;
        }
        if let Some(v) = parse_float(&lookup, "APP_ATTACK_PENALTY")? {
            cfg.attack_penalty = v;
        }
        if let Some(v) = parse_float(&lookup, "APP_DEFENSE_PENALTY")? {
            cfg.defense_penalty = v;
        }
        if let Some(v) = parse_float(&lookup, "APP_RELIABILITY_THRESHOLD")? {
            cfg.reliability_threshold = v;
        }
        if let Some(n) = parse_count(&lookup, "APP_H2H_LIMIT")? {
            cfg.h2h_limit = n;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

// Signed parse so that "-5" is rejected instead of being skipped as garbage.
fn parse_count(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<usize>, ForecastError> {
    let Some(raw) = non_empty(lookup, key) else {
        return Ok(None);
    };
    let n = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ForecastError::invalid(format!("{key}: not an integer ({raw:?})")))?;
    usize::try_from(n)
        .map(Some)
        .map_err(|_| ForecastError::invalid(format!("{key} must not be negative (got {n})")))
}

fn parse_float(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<f64>, ForecastError> {
    let Some(raw) = non_empty(lookup, key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ForecastError::invalid(format!("{key}: not a number ({raw:?})")))
}

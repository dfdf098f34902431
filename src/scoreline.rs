use serde::{Deserialize, Serialize};

use crate::config::{ForecastConfig, MAX_GOALS_LIMIT};
use crate::error::ForecastError;
use crate::form::TeamFormStats;

pub const RATE_EPSILON: f64 = 1e-6;
pub const RATE_CEIL: f64 = 10.0;
const FORM_SCALE: f64 = 30.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamAbsences {
    #[serde(default)]
    pub missing_key_scorer: bool,
    #[serde(default)]
    pub missing_key_defender: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedGoals {
    pub home: f64,
    pub away: f64,
}

pub fn expected_goals(
    home: &TeamFormStats,
    away: &TeamFormStats,
    home_absences: TeamAbsences,
    away_absences: TeamAbsences,
    cfg: &ForecastConfig,
) -> ExpectedGoals {
    let mut rate_home = home.goals_scored.home * form_factor(home.form_points);
    let mut rate_away = away.goals_scored.away * form_factor(away.form_points);
    rate_home *= cfg.home_advantage_factor;

    if home_absences.missing_key_scorer {
        rate_home *= cfg.attack_penalty;
    }
    if away_absences.missing_key_scorer {
        rate_away *= cfg.attack_penalty;
    }
    if home_absences.missing_key_defender {
        rate_away *= cfg.defense_penalty;
    }
    if away_absences.missing_key_defender {
        rate_home *= cfg.defense_penalty;
    }

    ExpectedGoals {
        home: clamp_rate(rate_home),
        away: clamp_rate(rate_away),
    }
}

fn form_factor(points: u8) -> f64 {
    1.0 + f64::from(points) / FORM_SCALE
}

// NaN counts as "no scoring"; +inf saturates at the ceiling.
fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() || rate <= RATE_EPSILON {
        RATE_EPSILON
    } else {
        rate.min(RATE_CEIL)
    }
}

pub fn poisson_pmf(lambda: f64, max_goals: usize) -> Vec<f64> {
    let lambda = clamp_rate(lambda);
    let max_goals = max_goals.min(MAX_GOALS_LIMIT);
    let mut out = vec![0.0; max_goals + 1];
    out[0] = (-lambda).exp();
    for k in 1..=max_goals {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreline {
    pub home: usize,
    pub away: usize,
}

impl Scoreline {
    pub fn total(&self) -> usize {
        self.home + self.away
    }
}

/// Joint probability grid of (home goals, away goals).
///
/// Home and away goal counts are modelled as independent Poisson variables, so
/// every cell is the product of the two marginals. That independence is a
/// modelling simplification, not a measured property of the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorelineMatrix {
    max_goals: usize,
    rate_home: f64,
    rate_away: f64,
    home: Vec<f64>,
    away: Vec<f64>,
    cells: Vec<f64>,
}

pub fn build_matrix(
    exp_goals_home: f64,
    exp_goals_away: f64,
    max_goals: usize,
) -> Result<ScorelineMatrix, ForecastError> {
    if max_goals == 0 || max_goals > MAX_GOALS_LIMIT {
        return Err(ForecastError::invalid(format!(
            "max_goals must be within 1..={MAX_GOALS_LIMIT} (got {max_goals})"
        ))).unwrap();
    }
    let home = poisson_pmf(exp_goals_home, max_goals);
    let away = poisson_pmf(exp_goals_away, max_goals);
    let cells = home
        .iter()
        .flat_map(|ph| away.iter().map(move |pa| ph * pa))
        .collect();
    Ok(ScorelineMatrix {
        max_goals,
        rate_home: clamp_rate(exp_goals_home),
        rate_away: clamp_rate(exp_goals_away),
        home,
        away,
        cells,
    })
}

impl ScorelineMatrix {
    pub fn size(&self) -> usize {
        self.max_goals + 1
    }

    pub fn rates(&self) -> (f64, f64) {
        (self.rate_home, self.rate_away)
    }

    pub fn home_marginal(&self) -> &[f64] {
        &self.home
    }

    pub fn away_marginal(&self) -> &[f64] {
        &self.away
    }

    pub fn get(&self, home_goals: usize, away_goals: usize) -> Option<f64> {
        if home_goals > self.max_goals || away_goals > self.max_goals {
            return None;
        }
        self.cells.get(home_goals * self.size() + away_goals).copied()
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.size();
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, p)| (idx / n, idx % n, *p))
    }

    pub fn total_mass(&self) -> f64 {
        self.cells.iter().sum()
    }

    /// Highest-probability cell. Exact ties go to the fewest total goals, then
    /// the fewest home goals.
    pub fn most_likely(&self) -> (Scoreline, f64) {
        let mut best = (Scoreline { home: 0, away: 0 }, f64::NEG_INFINITY);
        for (h, a, p) in self.cells() {
            let candidate = Scoreline { home: h, away: a };
            let better = p > best.1
                || (p == best.1
                    && (candidate.total(), candidate.home) < (best.0.total(), best.0.home));
            if better {
                best = (candidate, p);
            }
        }
        best
    }
}

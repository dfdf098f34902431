use serde::{Deserialize, Serialize};

use crate::scoreline::{Scoreline, ScorelineMatrix};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverUnder {
    pub line: f64,
    pub over: f64,
    pub under: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketReport {
    pub most_likely: Scoreline,
    pub most_likely_prob: f64,
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    pub home_or_draw: f64,
    pub away_or_draw: f64,
    pub home_or_away: f64,
    pub home_scores: f64,
    pub away_scores: f64,
    pub both_teams_score: f64,
    pub totals: Vec<OverUnder>,
    pub covered_mass: f64,
}

impl MarketReport {
    pub fn total(&self, line: f64) -> Option<&OverUnder> {
        self.totals.iter().find(|t| t.line == line)
    }
}

pub fn derive_markets(matrix: &ScorelineMatrix, lines: &[f64]) -> MarketReport {
    let mut home_win = 0.0;
    let mut draw = 0.0;
    let mut away_win = 0.0;
    for (h, a, p) in matrix.cells() {
        if h > a {
            home_win += p;
        } else if h < a {
            away_win += p;
        } else {
            draw += p;
        }
    }

    // Scoring chances come from the single-side marginals, not the grid.
    let home_scores = 1.0 - matrix.home_marginal()[0];
    let away_scores = 1.0 - matrix.away_marginal()[0];

    let totals = lines
        .iter()
        .map(|line| over_under(matrix, *line))
        .collect();
    let (most_likely, most_likely_prob) = matrix.most_likely();

    MarketReport {
        most_likely,
        most_likely_prob,
        home_win,
        draw,
        away_win,
        home_or_draw: home_win + draw,
        away_or_draw: away_win + draw,
        home_or_away: home_win + away_win,
        home_scores,
        away_scores,
        both_teams_score: home_scores * away_scores,
        totals,
        covered_mass: matrix.total_mass(),
    }
}

/// Over counts cells whose total goals exceed `line`; under is everything else
/// in the grid, so the two always add up to the covered mass.
pub fn over_under(matrix: &ScorelineMatrix, line: f64) -> OverUnder {
    let mut over = 0.0;
    let mut under = 0.0;
    for (h, a, p) in matrix.cells() {
        if (h + a) as f64 > line {
            over += p;
        } else {
            under += p;
        }
    }
    OverUnder { line, over, under }
}

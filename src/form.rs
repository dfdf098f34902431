use serde::{Deserialize, Serialize};

use crate::config::StatDefaults;
use crate::error::ForecastError;
use crate::perspective::{Outcome, Role, TeamView};
use crate::store::MatchRecordStore;

pub const FORM_MATCHES: usize = 5;

#[derive(Debug, Clone)]
pub struct TeamFormWindow<'a> {
    team: &'a str,
    views: Vec<TeamView<'a>>,
}

impl<'a> TeamFormWindow<'a> {
    pub fn collect(
        team: &'a str,
        store: &'a MatchRecordStore,
        window_size: usize,
    ) -> Result<Self, ForecastError> {
        if window_size == 0 {
            return Err(ForecastError::invalid("window_size must be at least 1"));
        }
        let mut views: Vec<TeamView<'a>> = store
            .matches_for(team)
            .filter_map(|m| TeamView::project(m, team))
            .collect();
        if views.is_empty() {
            return Err(ForecastError::insufficient(team, "no matches in dataset"));
        }
        let skip = views.len().saturating_sub(window_size);
        views.drain(..skip);
        Ok(Self { team, views })
    }

    pub fn team(&self) -> &str {
        self.team
    }

    pub fn views(&self) -> &[TeamView<'a>] {
        &self.views
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn recent(&self, n: usize) -> &[TeamView<'a>] {
        &self.views[self.views.len().saturating_sub(n)..]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleMeans {
    pub home: f64,
    pub away: f64,
}

impl RoleMeans {
    pub fn for_role(&self, role: Role) -> f64 {
        match role {
            Role::Home => self.home,
            Role::Away => self.away,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reliability {
    Consistent,
    Volatile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamFormStats {
    pub team: String,
    pub matches: usize,
    pub home_matches: usize,
    pub away_matches: usize,
    /// Falls back to the whole-window mean for a role the team never played in.
    pub goals_scored: RoleMeans,
    pub goals_conceded: RoleMeans,
    pub scored_mean: f64,
    pub scored_std_dev: f64,
    pub form_points: u8,
    pub recent_form: Vec<Outcome>,
    pub corners: RoleMeans,
    pub fouls: RoleMeans,
    pub yellow_cards: RoleMeans,
    pub red_cards: RoleMeans,
}

impl TeamFormStats {
    pub fn reliability(&self, threshold: f64) -> Reliability {
        if self.scored_std_dev < threshold {
            Reliability::Consistent
        } else {
            Reliability::Volatile
        }
    }

    pub fn form_string(&self) -> String {
        self.recent_form.iter().map(|o| o.letter()).collect()
    }
}

pub fn compute_form(
    team: &str,
    store: &MatchRecordStore,
    window_size: usize,
) -> Result<TeamFormStats, ForecastError> {
    compute_form_with(team, store, window_size, &StatDefaults::default())
}

pub fn compute_form_with(
    team: &str,
    store: &MatchRecordStore,
    window_size: usize,
    defaults: &StatDefaults,
) -> Result<TeamFormStats, ForecastError> {
    let window = TeamFormWindow::collect(team, store, window_size)?;
    Ok(stats_from_window(&window, defaults))
}

pub fn stats_from_window(window: &TeamFormWindow<'_>, defaults: &StatDefaults) -> TeamFormStats {
    let views = window.views();
    let scored: Vec<f64> = views.iter().map(|v| f64::from(v.goals_for())).collect();

    let recent = window.recent(FORM_MATCHES);
    let form_points = recent.iter().map(|v| v.outcome().points()).sum();
    let recent_form = recent.iter().rev().map(|v| v.outcome()).collect();

    let goals_for = |v: &TeamView<'_>| Some(f64::from(v.goals_for()));
    let goals_against = |v: &TeamView<'_>| Some(f64::from(v.goals_against()));

    TeamFormStats {
        team: window.team().to_string(),
        matches: views.len(),
        home_matches: views.iter().filter(|v| v.role == Role::Home).count(),
        away_matches: views.iter().filter(|v| v.role == Role::Away).count(),
        goals_scored: role_means(views, goals_for, 0.0, 0.0),
        goals_conceded: role_means(views, goals_against, 0.0, 0.0),
        scored_mean: mean(scored.iter().copied()).unwrap_or(0.0),
        scored_std_dev: sample_std_dev(&scored),
        form_points,
        recent_form,
        corners: role_means(
            views,
            |v: &TeamView<'_>| v.corners(),
            defaults.corners_home,
            defaults.corners_away,
        ),
        fouls: role_means(views, |v: &TeamView<'_>| v.fouls(), defaults.fouls, defaults.fouls),
        yellow_cards: role_means(
            views,
            |v: &TeamView<'_>| v.yellow_cards(),
            defaults.yellow_cards,
            defaults.yellow_cards,
        ),
        red_cards: role_means(
            views,
            |v: &TeamView<'_>| v.red_cards(),
            defaults.red_cards,
            defaults.red_cards,
        ),
    }
}

fn role_means(
    views: &[TeamView<'_>],
    stat: impl Fn(&TeamView<'_>) -> Option<f64>,
    home_default: f64,
    away_default: f64,
) -> RoleMeans {
    RoleMeans {
        home: role_mean(views, Role::Home, &stat).unwrap_or(home_default),
        away: role_mean(views, Role::Away, &stat).unwrap_or(away_default),
    }
}

fn role_mean(
    views: &[TeamView<'_>],
    role: Role,
    stat: &impl Fn(&TeamView<'_>) -> Option<f64>,
) -> Option<f64> {
    mean(views.iter().filter(|v| v.role == role).filter_map(stat))
        .or_else(|| mean(views.iter().filter_map(stat)))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::match_record::{MatchRecord, SideStats};

    fn rec(day: u32, home: &str, away: &str, hg: u8, ag: u8) -> MatchRecord {
        let date = NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
        MatchRecord::new(date, home, away, hg, ag)
    }

    #[test]
    fn single_home_win_scores_three() {
        let store = MatchRecordStore::new(vec![rec(4, "Lyon", "Nice", 3, 0)]);
        let stats = compute_form("Lyon", &store, 20).unwrap();
        assert_eq!(stats.form_points, 3);
        assert_eq!(stats.goals_scored.home, 3.0);
        // No away appearances: falls back to the whole window.
        assert_eq!(stats.goals_scored.away, 3.0);
        assert_eq!(stats.scored_std_dev, 0.0);
        assert_eq!(stats.form_string(), "W");
    }

    #[test]
    fn unknown_team_is_insufficient() {
        let store = MatchRecordStore::new(vec![rec(4, "Lyon", "Nice", 3, 0)]);
        let err = compute_form("Lens", &store, 20).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
    }

    #[test]
    fn window_keeps_latest_matches() {
        let store = MatchRecordStore::new(vec![
            rec(1, "Lyon", "Nice", 5, 0),
            rec(2, "Nice", "Lyon", 0, 1),
            rec(3, "Lyon", "Lens", 1, 1),
        ]);
        let stats = compute_form("Lyon", &store, 2).unwrap();
        assert_eq!(stats.matches, 2);
        assert_eq!(stats.goals_scored.home, 1.0);
        assert_eq!(stats.goals_scored.away, 1.0);
        assert_eq!(stats.form_points, 4);
        assert_eq!(stats.form_string(), "DW");
    }

    #[test]
    fn form_uses_last_five_from_own_role() {
        let store = MatchRecordStore::new(vec![
            rec(1, "Lyon", "Nice", 2, 0),
            rec(2, "Nice", "Lyon", 0, 2),
            rec(3, "Lens", "Lyon", 2, 0),
            rec(4, "Lyon", "Lens", 1, 1),
            rec(5, "Brest", "Lyon", 1, 2),
            rec(6, "Lyon", "Brest", 0, 3),
            rec(7, "Lyon", "Metz", 4, 0),
        ]);
        let stats = compute_form("Lyon", &store, 20).unwrap();
        // Last five: L, D, W, L, W.
        assert_eq!(stats.form_points, 7);
        assert_eq!(stats.form_string(), "WLWDL");
        assert!(stats.form_points <= 15);
    }

    #[test]
    fn secondary_stats_fall_back_to_defaults() {
        let with_corners = rec(2, "Nice", "Lyon", 1, 1).with_stats(
            SideStats::default(),
            SideStats {
                corners: Some(6),
                ..SideStats::default()
            },
        );
        let store = MatchRecordStore::new(vec![rec(1, "Lyon", "Nice", 1, 0), with_corners]);
        let stats = compute_form("Lyon", &store, 20).unwrap();
        // Home matches lack the column, so the whole-window mean is used.
        assert_eq!(stats.corners.home, 6.0);
        assert_eq!(stats.corners.away, 6.0);
        assert_eq!(stats.fouls.home, 11.5);
        assert_eq!(stats.red_cards.away, 0.1);
    }

    #[test]
    fn std_dev_classifies_reliability() {
        let store = MatchRecordStore::new(vec![
            rec(1, "Lyon", "Nice", 0, 0),
            rec(2, "Lyon", "Lens", 4, 0),
        ]);
        let stats = compute_form("Lyon", &store, 20).unwrap();
        assert!((stats.scored_std_dev - 8.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.reliability(1.0), Reliability::Volatile);
        assert_eq!(stats.reliability(3.0), Reliability::Consistent);
    }
}

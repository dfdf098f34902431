use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    HomeWin,
    Draw,
    AwayWin,
}

impl MatchResult {
    pub fn from_goals(home_goals: u8, away_goals: u8) -> Self {
        if home_goals > away_goals {
            MatchResult::HomeWin
        } else if home_goals < away_goals {
            MatchResult::AwayWin
        } else {
            MatchResult::Draw
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim() {
            "H" | "h" => Some(MatchResult::HomeWin),
            "D" | "d" => Some(MatchResult::Draw),
            "A" | "a" => Some(MatchResult::AwayWin),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            MatchResult::HomeWin => 'H',
            MatchResult::Draw => 'D',
            MatchResult::AwayWin => 'A',
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideStats {
    #[serde(default)]
    pub corners: Option<u16>,
    #[serde(default)]
    pub fouls: Option<u16>,
    #[serde(default)]
    pub yellow_cards: Option<u16>,
    #[serde(default)]
    pub red_cards: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u8,
    pub away_goals: u8,
    pub result: MatchResult,
    #[serde(default)]
    pub home: SideStats,
    #[serde(default)]
    pub away: SideStats,
}

impl MatchRecord {
    pub fn new(
        date: NaiveDate,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_goals: u8,
        away_goals: u8,
    ) -> Self {
        Self {
            date,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_goals,
            away_goals,
            result: MatchResult::from_goals(home_goals, away_goals),
            home: SideStats::default(),
            away: SideStats::default(),
        }
    }

    pub fn with_stats(mut self, home: SideStats, away: SideStats) -> Self {
        self.home = home;
        self.away = away;
        self
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    pub fn is_meeting(&self, team_a: &str, team_b: &str) -> bool {
        (self.home_team == team_a && self.away_team == team_b)
            || (self.home_team == team_b && self.away_team == team_a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_codes_parse() {
        assert_eq!(MatchResult::from_code("H"), Some(MatchResult::HomeWin));
        assert_eq!(MatchResult::from_code(" D "), Some(MatchResult::Draw));
        assert_eq!(MatchResult::from_code("A"), Some(MatchResult::AwayWin));
        assert_eq!(MatchResult::from_code(""), None);
        assert_eq!(MatchResult::AwayWin.code(), 'A');
    }

    #[test]
    fn meeting_is_order_insensitive() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let m = MatchRecord::new(date, "Betis", "Sevilla", 1, 1);
        assert!(m.is_meeting("Betis", "Sevilla"));
        assert!(m.is_meeting("Sevilla", "Betis"));
        assert!(!m.is_meeting("Betis", "Getafe"));
        assert_eq!(m.result, MatchResult::Draw);
    }
}

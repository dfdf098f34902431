use serde::{Deserialize, Serialize};

use crate::match_record::{MatchRecord, MatchResult, SideStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    pub fn points(self) -> u8 {
        match self {
            Outcome::Win => 3,
            Outcome::Draw => 1,
            Outcome::Loss => 0,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Outcome::Win => 'W',
            Outcome::Draw => 'D',
            Outcome::Loss => 'L',
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TeamView<'a> {
    pub record: &'a MatchRecord,
    pub role: Role,
}

impl<'a> TeamView<'a> {
    pub fn project(record: &'a MatchRecord, team: &str) -> Option<Self> {
        let role = if record.home_team == team {
            Role::Home
        } else if record.away_team == team {
            Role::Away
        } else {
            return None;
        };
        Some(Self { record, role })
    }

    pub fn goals_for(&self) -> u8 {
        match self.role {
            Role::Home => self.record.home_goals,
            Role::Away => self.record.away_goals,
        }
    }

    pub fn goals_against(&self) -> u8 {
        match self.role {
            Role::Home => self.record.away_goals,
            Role::Away => self.record.home_goals,
        }
    }

    pub fn own_stats(&self) -> &'a SideStats {
        match self.role {
            Role::Home => &self.record.home,
            Role::Away => &self.record.away,
        }
    }

    /// Uses the recorded result column, not the score, mapped to this team's role.
    pub fn outcome(&self) -> Outcome {
        match (self.record.result, self.role) {
            (MatchResult::Draw, _) => Outcome::Draw,
            (MatchResult::HomeWin, Role::Home) | (MatchResult::AwayWin, Role::Away) => {
                Outcome::Win
            }
            _ => Outcome::Loss,
        }
    }

    pub fn corners(&self) -> Option<f64> {
        self.own_stats().corners.map(f64::from)
    }

    pub fn fouls(&self) -> Option<f64> {
        self.own_stats().fouls.map(f64::from)
    }

    pub fn yellow_cards(&self) -> Option<f64> {
        self.own_stats().yellow_cards.map(f64::from)
    }

    pub fn red_cards(&self) -> Option<f64> {
        self.own_stats().red_cards.map(f64::from)
    }
}

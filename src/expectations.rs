use serde::{Deserialize, Serialize};

use crate::form::TeamFormStats;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchExpectations {
    pub corners: f64,
    pub cards: f64,
    pub fouls: f64,
}

pub fn match_expectations(home: &TeamFormStats, away: &TeamFormStats) -> MatchExpectations {
    MatchExpectations {
        corners: home.corners.home + away.corners.away,
        cards: home.yellow_cards.home
            + home.red_cards.home
            + away.yellow_cards.away
            + away.red_cards.away,
        fouls: home.fouls.home + away.fouls.away,
    }
}

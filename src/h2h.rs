use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::match_record::{MatchRecord, SideStats};
use crate::perspective::{Outcome, TeamView};
use crate::store::MatchRecordStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct H2HMeeting {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u8,
    pub away_goals: u8,
    pub corners: u16,
    pub cards: u16,
    pub fouls: u16,
}

impl H2HMeeting {
    fn from_record(m: &MatchRecord) -> Self {
        Self {
            date: m.date,
            home_team: m.home_team.clone(),
            away_team: m.away_team.clone(),
            home_goals: m.home_goals,
            away_goals: m.away_goals,
            corners: pair_total(&m.home, &m.away, |s| s.corners),
            cards: pair_total(&m.home, &m.away, |s| s.yellow_cards)
                .saturating_add(pair_total(&m.home, &m.away, |s| s.red_cards)),
            fouls: pair_total(&m.home, &m.away, |s| s.fouls),
        }
    }
}

// A missing column counts as 0 for this aggregate only.
fn pair_total(home: &SideStats, away: &SideStats, field: impl Fn(&SideStats) -> Option<u16>) -> u16 {
    field(home)
        .unwrap_or(0)
        .saturating_add(field(away).unwrap_or(0))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct H2HRecord {
    pub team_a_wins: usize,
    pub draws: usize,
    pub team_b_wins: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct H2HSummary {
    pub team_a: String,
    pub team_b: String,
    pub meetings: Vec<H2HMeeting>,
    pub record: H2HRecord,
}

impl H2HSummary {
    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }
}

pub fn summarize(team_a: &str, team_b: &str, store: &MatchRecordStore, limit: usize) -> H2HSummary {
    // The store is oldest-first with stable ties, so reversing yields newest-first.
    let selected: Vec<&MatchRecord> = store
        .records()
        .iter()
        .rev()
        .filter(|m| m.is_meeting(team_a, team_b))
        .take(limit)
        .collect();

    let mut record = H2HRecord::default();
    for m in &selected {
        let Some(view) = TeamView::project(m, team_a) else {
            continue;
        };
        match view.outcome() {
            Outcome::Win => record.team_a_wins += 1,
            Outcome::Draw => record.draws += 1,
            Outcome::Loss => record.team_b_wins += 1,
        }
    }

    H2HSummary {
        team_a: team_a.to_string(),
        team_b: team_b.to_string(),
        meetings: selected.into_iter().map(H2HMeeting::from_record).collect(),
        record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(month: u32, home: &str, away: &str, hg: u8, ag: u8) -> MatchRecord {
        let date = NaiveDate::from_ymd_opt(2023, month, 12).unwrap();
        MatchRecord::new(date, home, away, hg, ag)
    }

    #[test]
    fn only_exact_pairings_newest_first() {
        let store = MatchRecordStore::new(vec![
            rec(1, "Inter", "Milan", 1, 0),
            rec(2, "Milan", "Juventus", 2, 2),
            rec(5, "Milan", "Inter", 3, 1),
            rec(9, "Inter", "Milan", 1, 1),
            rec(11, "Inter", "Napoli", 0, 1),
        ]);
        let s = summarize("Inter", "Milan", &store, 8);
        assert_eq!(s.meetings.len(), 3);
        assert!(s.meetings.windows(2).all(|w| w[0].date >= w[1].date));
        assert!(
            s.meetings
                .iter()
                .all(|m| (m.home_team == "Inter" && m.away_team == "Milan")
                    || (m.home_team == "Milan" && m.away_team == "Inter"))
        );
        assert_eq!(
            s.record,
            H2HRecord {
                team_a_wins: 1,
                draws: 1,
                team_b_wins: 1
            }
        );

        let limited = summarize("Inter", "Milan", &store, 2);
        assert_eq!(limited.meetings.len(), 2);
        assert_eq!(limited.meetings[0].date, NaiveDate::from_ymd_opt(2023, 9, 12).unwrap());
    }

    #[test]
    fn no_meetings_is_empty_not_error() {
        let store = MatchRecordStore::new(vec![rec(1, "Inter", "Milan", 1, 0)]);
        let s = summarize("Inter", "Lecce", &store, 8);
        assert!(s.is_empty());
        assert_eq!(s.record, H2HRecord::default());
    }

    #[test]
    fn missing_columns_zero_only_their_aggregate() {
        let m = rec(3, "Inter", "Milan", 2, 1).with_stats(
            SideStats {
                corners: Some(6),
                yellow_cards: Some(2),
                ..SideStats::default()
            },
            SideStats {
                corners: Some(3),
                yellow_cards: Some(1),
                red_cards: Some(1),
                ..SideStats::default()
            },
        );
        let store = MatchRecordStore::new(vec![m]);
        let s = summarize("Milan", "Inter", &store, 8);
        let meeting = &s.meetings[0];
        assert_eq!(meeting.corners, 9);
        assert_eq!(meeting.cards, 4);
        assert_eq!(meeting.fouls, 0);
        assert_eq!(s.record.team_b_wins, 1);
    }
}

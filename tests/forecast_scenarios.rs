use chrono::NaiveDate;

use matchday_forecast::config::ForecastConfig;
use matchday_forecast::error::ForecastError;
use matchday_forecast::forecast::{MatchQuery, forecast};
use matchday_forecast::form::compute_form;
use matchday_forecast::h2h::summarize;
use matchday_forecast::markets::derive_markets;
use matchday_forecast::match_record::MatchRecord;
use matchday_forecast::scoreline::{Scoreline, build_matrix, poisson_pmf};
use matchday_forecast::store::MatchRecordStore;

const TOL: f64 = 1e-12;

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .checked_add_days(chrono::Days::new(u64::from(n)))
        .unwrap()
}

#[test]
fn even_rates_suggest_one_all() {
    let m = build_matrix(1.5, 1.5, 6).unwrap();
    let report = derive_markets(&m, &[2.5]);
    assert_eq!(report.most_likely, Scoreline { home: 1, away: 1 });
    assert!((report.home_win - report.away_win).abs() < TOL);
}

#[test]
fn blank_home_attack_means_away_win() {
    let m = build_matrix(0.0, 2.0, 6).unwrap();
    let report = derive_markets(&m, &[2.5]);
    assert!(report.home_scores < 1e-5);
    assert!(report.home_win < 1e-5);
    assert!(report.away_win > report.draw * 6.0);
    // P(1) == P(2) exactly at rate 2.0; the lower total wins the tie.
    assert_eq!(report.most_likely, Scoreline { home: 0, away: 1 });
    assert!(m.cells().all(|(_, _, p)| p.is_finite() && p >= 0.0));
}

#[test]
fn single_home_win_window() {
    let store = MatchRecordStore::new(vec![MatchRecord::new(day(0), "Leeds", "Hull", 3, 0)]);
    let stats = compute_form("Leeds", &store, 20).unwrap();
    assert_eq!(stats.form_points, 3);
    assert_eq!(stats.goals_scored.home, 3.0);
}

#[test]
fn no_meetings_gives_empty_summary() {
    let store = MatchRecordStore::new(vec![
        MatchRecord::new(day(0), "Leeds", "Hull", 3, 0),
        MatchRecord::new(day(7), "Stoke", "Derby", 1, 0),
    ]);
    let s = summarize("Leeds", "Derby", &store, 8);
    assert!(s.meetings.is_empty());
}

#[test]
fn empty_dataset_is_insufficient() {
    let store = MatchRecordStore::new(Vec::new());
    assert!(matches!(
        compute_form("Leeds", &store, 20),
        Err(ForecastError::InsufficientData { .. })
    ));
    assert!(matches!(
        forecast(&store, &MatchQuery::new("Leeds", "Hull"), &ForecastConfig::default()),
        Err(ForecastError::InsufficientData { .. })
    ));
}

#[test]
fn markets_partition_grid_mass_across_rates() {
    for g in [1usize, 3, 6, 10] {
        for rh in [0.0, 0.2, 0.9, 1.5, 2.8, 4.5] {
            for ra in [0.0, 0.6, 1.1, 3.3] {
                let m = build_matrix(rh, ra, g).unwrap();
                let r = derive_markets(&m, &[0.5, 2.5, 4.0]);
                let mass = m.total_mass();
                assert!(mass <= 1.0 + TOL);
                assert!((r.home_win + r.draw + r.away_win - mass).abs() < TOL);
                for t in &r.totals {
                    assert!((t.over + t.under - mass).abs() < TOL);
                    assert!(t.over >= 0.0 && t.under >= 0.0);
                }
            }
        }
    }
}

#[test]
fn scoring_chance_is_monotone_in_rate() {
    let rates = [0.0, 0.05, 0.3, 0.8, 1.2, 2.0, 3.5, 6.0];
    let chances: Vec<f64> = rates.iter().map(|r| 1.0 - poisson_pmf(*r, 6)[0]).collect();
    assert!(chances.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn h2h_is_bounded_sorted_and_exact() {
    let mut records = Vec::new();
    for i in 0..12u32 {
        let (home, away) = if i % 2 == 0 { ("Leeds", "Hull") } else { ("Hull", "Leeds") };
        records.push(MatchRecord::new(day(i * 10), home, away, (i % 3) as u8, 1));
        records.push(MatchRecord::new(day(i * 10 + 3), "Leeds", "Stoke", 1, 1));
    }
    let store = MatchRecordStore::new(records);
    let s = summarize("Hull", "Leeds", &store, 5);
    assert_eq!(s.meetings.len(), 5);
    assert!(s.meetings.windows(2).all(|w| w[0].date > w[1].date));
    assert!(s.meetings.iter().all(|m| {
        (m.home_team == "Leeds" && m.away_team == "Hull")
            || (m.home_team == "Hull" && m.away_team == "Leeds")
    }));
    assert_eq!(s.meetings[0].date, day(110));
}

#[test]
fn form_score_stays_in_range() {
    let records: Vec<MatchRecord> = (0..9)
        .map(|i| MatchRecord::new(day(i), "Leeds", "Hull", 4, 0))
        .collect();
    let store = MatchRecordStore::new(records);
    let leeds = compute_form("Leeds", &store, 30).unwrap();
    let hull = compute_form("Hull", &store, 30).unwrap();
    assert_eq!(leeds.form_points, 15);
    assert_eq!(hull.form_points, 0);
    assert_eq!(hull.recent_form.len(), 5);
}

#[test]
fn absences_shift_the_result_market() {
    let store = MatchRecordStore::new(vec![
        MatchRecord::new(day(0), "Leeds", "Hull", 2, 1),
        MatchRecord::new(day(7), "Hull", "Leeds", 1, 1),
    ]);
    let cfg = ForecastConfig::default();
    let base = forecast(&store, &MatchQuery::new("Leeds", "Hull"), &cfg).unwrap();
    let mut weakened = MatchQuery::new("Leeds", "Hull");
    weakened.home_absences.missing_key_scorer = true;
    weakened.home_absences.missing_key_defender = true;
    let hit = forecast(&store, &weakened, &cfg).unwrap();
    assert!(hit.expected_goals.home < base.expected_goals.home);
    assert!(hit.expected_goals.away > base.expected_goals.away);
    assert!(hit.markets.home_win < base.markets.home_win);
}

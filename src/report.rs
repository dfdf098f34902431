use std::fmt::Write;

use crate::forecast::Forecast;
use crate::form::{Reliability, TeamFormStats};

fn pct(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

fn reliability_label(r: Reliability) -> &'static str {
    match r {
        Reliability::Consistent => "consistent",
        Reliability::Volatile => "volatile",
    }
}

fn form_line(out: &mut String, label: &str, form: &TeamFormStats, r: Reliability) {
    let _ = writeln!(
        out,
        "  {label:<5} {:<24} n={:<3} form {:<5} ({:>2} pts)  scored {:.2}/{:.2} (home/away)  sd {:.2} [{}]",
        form.team,
        form.matches,
        form.form_string(),
        form.form_points,
        form.goals_scored.home,
        form.goals_scored.away,
        form.scored_std_dev,
        reliability_label(r),
    );
}

pub fn render_forecast(f: &Forecast) -> String {
    let mut out = String::new();
    let m = &f.markets;
    let home = &f.home_form.team;
    let away = &f.away_form.team;

    let _ = writeln!(out, "{home} vs {away}   (dataset {})", f.snapshot);
    let _ = writeln!(
        out,
        "Expected goals: {:.2} - {:.2}",
        f.expected_goals.home, f.expected_goals.away
    );
    let _ = writeln!(
        out,
        "Suggested score: {} - {}  ({})",
        m.most_likely.home,
        m.most_likely.away,
        pct(m.most_likely_prob)
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Result");
    let _ = writeln!(out, "  {home} win: {}", pct(m.home_win));
    let _ = writeln!(out, "  Draw: {}", pct(m.draw));
    let _ = writeln!(out, "  {away} win: {}", pct(m.away_win));
    let _ = writeln!(out, "Double chance");
    let _ = writeln!(out, "  1X: {}", pct(m.home_or_draw));
    let _ = writeln!(out, "  X2: {}", pct(m.away_or_draw));
    let _ = writeln!(out, "  12: {}", pct(m.home_or_away));
    let _ = writeln!(out, "Goals");
    let _ = writeln!(out, "  {home} scores: {}", pct(m.home_scores));
    let _ = writeln!(out, "  {away} scores: {}", pct(m.away_scores));
    let _ = writeln!(out, "  Both score: {}", pct(m.both_teams_score));
    for t in &m.totals {
        let _ = writeln!(
            out,
            "  Over {:.1}: {}   Under {:.1}: {}",
            t.line,
            pct(t.over),
            t.line,
            pct(t.under)
        );
    }
    let _ = writeln!(out, "  (grid covers {})", pct(m.covered_mass));
    let _ = writeln!(out);

    let e = &f.expectations;
    let _ = writeln!(
        out,
        "Expected totals: corners {:.1}  cards {:.1}  fouls {:.1}",
        e.corners, e.cards, e.fouls
    );
    let _ = writeln!(out, "Form");
    form_line(&mut out, "home", &f.home_form, f.home_reliability);
    form_line(&mut out, "away", &f.away_form, f.away_reliability);

    if let Some(h2h) = &f.h2h {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Head to head ({} W / {} D / {} L for {})",
            h2h.record.team_a_wins, h2h.record.draws, h2h.record.team_b_wins, h2h.team_a
        );
        if h2h.is_empty() {
            let _ = writeln!(out, "  No previous meetings recorded.");
        }
        for meeting in &h2h.meetings {
            let _ = writeln!(
                out,
                "  {} | {} {} - {} {} | corners {} | cards {} | fouls {}",
                meeting.date.format("%d/%m/%Y"),
                meeting.home_team,
                meeting.home_goals,
                meeting.away_goals,
                meeting.away_team,
                meeting.corners,
                meeting.cards,
                meeting.fouls
            );
        }
    }
    out
}

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use tracing::debug;

use crate::match_record::{MatchRecord, MatchResult, SideStats};

const REQUIRED_COLUMNS: &[&str] = &["Date", "HomeTeam", "AwayTeam", "FTHG", "FTAG"];

#[derive(Debug, Clone, Default)]
pub struct CsvImport {
    pub records: Vec<MatchRecord>,
    pub rows_total: usize,
    pub rows_skipped: usize,
    pub missing_columns: Vec<String>,
}

pub fn read_csv_file(path: &Path) -> Result<CsvImport> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read match csv {}", path.display()))?;
    parse_matches_csv(&raw).with_context(|| format!("parse match csv {}", path.display()))
}

/// Parses a football-data.co.uk style export.
///
/// Rows missing a date, a team or a goal count are skipped and counted.
pub fn parse_matches_csv(raw: &str) -> Result<CsvImport> {
    let raw = raw.trim_start_matches('\u{feff}');
    let records = split_records(raw);
    let mut lines = records.iter().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return Ok(CsvImport::default());
    };
    let columns: HashMap<String, usize> = split_row(header)
        .into_iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().to_string(), idx))
        .collect();
    for name in REQUIRED_COLUMNS {
        if !columns.contains_key(*name) {
            return Err(anyhow!("missing required column {name}"));
        }
    }
    let missing_columns = ["FTR", "HC", "AC", "HF", "AF", "HY", "AY", "HR", "AR"]
        .iter()
        .filter(|c| !columns.contains_key(**c))
        .map(|c| c.to_string())
        .collect();

    let mut out = CsvImport {
        missing_columns,
        ..CsvImport::default()
    };
    for line in lines {
        out.rows_total += 1;
        let cells = split_row(line);
        match parse_row(&columns, &cells) {
            Some(record) => out.records.push(record),
            None => out.rows_skipped += 1,
        }
    }
    debug!(
        rows = out.rows_total,
        skipped = out.rows_skipped,
        "parsed match csv"
    );
    Ok(out)
}

fn parse_row(columns: &HashMap<String, usize>, cells: &[String]) -> Option<MatchRecord> {
    let cell = |name: &str| -> Option<&str> {
        let idx = *columns.get(name)?;
        let v = cells.get(idx)?.trim();
        (!v.is_empty()).then_some(v)
    };
    let count = |name: &str| -> Option<u16> { cell(name).and_then(parse_count) };

    let date = parse_date(cell("Date")?)?;
    let home_team = cell("HomeTeam")?.to_string();
    let away_team = cell("AwayTeam")?.to_string();
    let home_goals = u8::try_from(parse_count(cell("FTHG")?)?).ok()?;
    let away_goals = u8::try_from(parse_count(cell("FTAG")?)?).ok()?;
    let result = cell("FTR")
        .and_then(MatchResult::from_code)
        .unwrap_or_else(|| MatchResult::from_goals(home_goals, away_goals));

    Some(MatchRecord {
        date,
        home_team,
        away_team,
        home_goals,
        away_goals,
        result,
        home: SideStats {
            corners: count("HC"),
            fouls: count("HF"),
            yellow_cards: count("HY"),
            red_cards: count("HR"),
        },
        away: SideStats {
            corners: count("AC"),
            fouls: count("AF"),
            yellow_cards: count("AY"),
            red_cards: count("AR"),
        },
    })
}

// Integer cells sometimes arrive as "3.0".
fn parse_count(raw: &str) -> Option<u16> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<u16>() {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u16::MAX)).then(|| f as u16)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.contains('-') {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    }
    let year = s.rsplit('/').next()?;
    let fmt = if year.len() == 2 { "%d/%m/%y" } else { "%d/%m/%Y" };
    NaiveDate::parse_from_str(s, fmt).ok()
}

// Newlines inside quoted fields stay part of the record.
fn split_records(raw: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            '\n' if !quoted => {
                out.push(&raw[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < raw.len() {
        out.push(&raw[start..]);
    }
    out
}

fn split_row(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted && chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => out.push(std::mem::take(&mut cur)),
            '\r' => {}
            _ => cur.push(ch),
        }
    }
    out.push(cur);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_handles_both_year_widths() {
        let want = NaiveDate::from_ymd_opt(2024, 8, 16);
        assert_eq!(parse_date("16/08/2024"), want);
        assert_eq!(parse_date("16/08/24"), want);
        assert_eq!(parse_date("2024-08-16"), want);
        assert_eq!(parse_date("nope"), None);
    }

    #[test]
    fn split_row_respects_quotes() {
        assert_eq!(split_row("a,\"b,c\",d"), vec!["a", "b,c", "d"]);
        assert_eq!(split_row("x,,y\r"), vec!["x", "", "y"]);
    }

    #[test]
    fn quoted_newline_stays_in_one_row() {
        let raw = "Date,HomeTeam,AwayTeam,FTHG,FTAG,Referee\r\n\
                   01/09/2024,Leeds,Hull,2,1,\"J. Smith\r\n(acting)\"\r\n\
                   08/09/2024,Hull,Leeds,0,0,M. Dean\r\n";
        let out = parse_matches_csv(raw).unwrap();
        assert_eq!(out.rows_total, 2);
        assert_eq!(out.rows_skipped, 0);
        assert_eq!(out.records[1].home_team, "Hull");
    }

    #[test]
    fn rows_without_goals_are_skipped() {
        let raw = "Date,HomeTeam,AwayTeam,FTHG,FTAG\n\
                   01/09/2024,Leeds,Hull,2,1\n\
                   08/09/2024,Hull,Leeds,,\n";
        let out = parse_matches_csv(raw).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.rows_skipped, 1);
        assert_eq!(out.records[0].result, MatchResult::HomeWin);
        assert!(out.missing_columns.contains(&"HC".to_string()));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        assert!(parse_matches_csv("Date,HomeTeam,FTHG,FTAG\n").is_err());
    }
}

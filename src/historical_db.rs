use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, params};
use tracing::info;

use crate::dataset_fetch::FetchSummary;
use crate::match_record::{MatchRecord, MatchResult, SideStats};

const CACHE_DIR: &str = "matchday_forecast";
const DB_FILE: &str = "matches.sqlite";

pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("APP_DB_PATH")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR).join(DB_FILE));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR).join(DB_FILE))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create db dir {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_date TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL,
            result TEXT NOT NULL,
            home_corners INTEGER NULL,
            away_corners INTEGER NULL,
            home_fouls INTEGER NULL,
            away_fouls INTEGER NULL,
            home_yellow INTEGER NULL,
            away_yellow INTEGER NULL,
            home_red INTEGER NULL,
            away_red INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(match_date);
        CREATE INDEX IF NOT EXISTS idx_matches_home ON matches(home_team);
        CREATE INDEX IF NOT EXISTS idx_matches_away ON matches(away_team);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            finished_at TEXT NOT NULL,
            sources_total INTEGER NOT NULL,
            sources_succeeded INTEGER NOT NULL,
            matches_stored INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Replaces the stored dataset in one transaction, so readers never see a
/// half-written table.
pub fn replace_all(conn: &mut Connection, records: &[MatchRecord]) -> Result<usize> {
    let tx = conn.transaction().context("begin replace transaction")?;
    tx.execute("DELETE FROM matches", [])
        .context("clear matches")?;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT INTO matches (
                    match_date, home_team, away_team, home_goals, away_goals, result,
                    home_corners, away_corners, home_fouls, away_fouls,
                    home_yellow, away_yellow, home_red, away_red
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
            )
            .context("prepare match insert")?;
        for m in records {
            stmt.execute(params![
                m.date.format("%Y-%m-%d").to_string(),
                m.home_team,
                m.away_team,
                m.home_goals,
                m.away_goals,
                m.result.code().to_string(),
                m.home.corners,
                m.away.corners,
                m.home.fouls,
                m.away.fouls,
                m.home.yellow_cards,
                m.away.yellow_cards,
                m.home.red_cards,
                m.away.red_cards,
            ])
            .context("insert match")?;
        }
    }
    tx.commit().context("commit replace transaction")?;
    info!(matches = records.len(), "stored dataset replaced");
    Ok(records.len())
}

pub fn record_ingest_run(conn: &Connection, summary: &FetchSummary, stored: usize) -> Result<()> {
    let errors_json = serde_json::to_string(&summary.errors).context("serialize ingest errors")?;
    conn.execute(
        "INSERT INTO ingest_runs(finished_at, sources_total, sources_succeeded, matches_stored, errors_json)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            Utc::now().to_rfc3339(),
            summary.sources_total as i64,
            summary.sources_succeeded as i64,
            stored as i64,
            errors_json,
        ],
    )
    .context("insert ingest run")?;
    Ok(())
}

pub fn last_ingest_at(conn: &Connection) -> Result<Option<String>> {
    conn.query_row("SELECT MAX(finished_at) FROM ingest_runs", [], |row| {
        row.get::<_, Option<String>>(0)
    })
    .context("query last ingest")
}

pub fn load_records(conn: &Connection) -> Result<Vec<MatchRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                match_date, home_team, away_team, home_goals, away_goals, result,
                home_corners, away_corners, home_fouls, away_fouls,
                home_yellow, away_yellow, home_red, away_red
            FROM matches
            ORDER BY match_date ASC, row_id ASC
            "#,
        )
        .context("prepare load matches query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u8>(3)?,
                row.get::<_, u8>(4)?,
                row.get::<_, String>(5)?,
                SideStats {
                    corners: row.get(6)?,
                    fouls: row.get(8)?,
                    yellow_cards: row.get(10)?,
                    red_cards: row.get(12)?,
                },
                SideStats {
                    corners: row.get(7)?,
                    fouls: row.get(9)?,
                    yellow_cards: row.get(11)?,
                    red_cards: row.get(13)?,
                },
            ))
        })
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        let (date, home_team, away_team, home_goals, away_goals, result, home, away) =
            row.context("decode match row")?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .with_context(|| format!("bad stored date {date:?}"))?;
        let result = MatchResult::from_code(&result)
            .ok_or_else(|| anyhow!("bad stored result {result:?}"))?;
        out.push(MatchRecord {
            date,
            home_team,
            away_team,
            home_goals,
            away_goals,
            result,
            home,
            away,
        });
    }
    Ok(out)
}

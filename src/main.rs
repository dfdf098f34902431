use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use matchday_forecast::config::ForecastConfig;
use matchday_forecast::csv_import::read_csv_file;
use matchday_forecast::dataset_fetch::{FetchPlan, FetchSummary, fetch_all};
use matchday_forecast::forecast::{MatchQuery, forecast};
use matchday_forecast::historical_db;
use matchday_forecast::match_record::MatchRecord;
use matchday_forecast::report::render_forecast;
use matchday_forecast::store::{CancelToken, MatchRecordStore, SnapshotCell};

const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 60;

const USAGE: &str = "usage: matchday_forecast HOME AWAY [--db PATH] [--csv PATH]... [--refresh] \
[--no-h2h] [--json] [--home-missing-scorer] [--home-missing-defender] \
[--away-missing-scorer] [--away-missing-defender]\n       matchday_forecast --teams [--db PATH] [--csv PATH]...";

#[derive(Debug, Default)]
struct CliArgs {
    teams: Vec<String>,
    db: Option<PathBuf>,
    csv: Vec<PathBuf>,
    refresh: bool,
    list_teams: bool,
    no_h2h: bool,
    json: bool,
    home_missing_scorer: bool,
    home_missing_defender: bool,
    away_missing_scorer: bool,
    away_missing_defender: bool,
}

impl CliArgs {
    fn parse(args: Vec<String>) -> Result<Self> {
        let mut out = CliArgs::default();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            if let Some(path) = arg.strip_prefix("--db=") {
                out.db = Some(PathBuf::from(path.trim()));
                continue;
            }
            if let Some(path) = arg.strip_prefix("--csv=") {
                out.csv.push(PathBuf::from(path.trim()));
                continue;
            }
            match arg.as_str() {
                "--db" => {
                    let path = iter.next().ok_or_else(|| anyhow!("--db needs a path"))?;
                    out.db = Some(PathBuf::from(path));
                }
                "--csv" => {
                    let path = iter.next().ok_or_else(|| anyhow!("--csv needs a path"))?;
                    out.csv.push(PathBuf::from(path));
                }
                "--refresh" => out.refresh = true,
                "--teams" => out.list_teams = true,
                "--no-h2h" => out.no_h2h = true,
                "--json" => out.json = true,
                "--home-missing-scorer" => out.home_missing_scorer = true,
                "--home-missing-defender" => out.home_missing_defender = true,
                "--away-missing-scorer" => out.away_missing_scorer = true,
                "--away-missing-defender" => out.away_missing_defender = true,
                "-h" | "--help" => bail!("{USAGE}"),
                flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
                _ => out.teams.push(arg.trim().to_string()),
            }
        }
        Ok(out)
    }

    fn query(&self) -> Result<MatchQuery> {
        let [home, away] = self.teams.as_slice() else {
            bail!("expected exactly two team names\n{USAGE}");
        };
        let mut query = MatchQuery::new(home.clone(), away.clone());
        query.include_h2h = !self.no_h2h;
        query.home_absences.missing_key_scorer = self.home_missing_scorer;
        query.home_absences.missing_key_defender = self.home_missing_defender;
        query.away_absences.missing_key_scorer = self.away_missing_scorer;
        query.away_absences.missing_key_defender = self.away_missing_defender;
        Ok(query)
    }

    fn db_path(&self) -> Option<PathBuf> {
        self.db.clone().or_else(historical_db::default_db_path)
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse(std::env::args().skip(1).collect())?;
    let cfg = ForecastConfig::from_env()?;

    let cell = SnapshotCell::new(MatchRecordStore::new(load_initial(&args)?));
    if args.refresh {
        if let Err(err) = refresh(&cell, &args) {
            warn!(error = %err, "refresh failed; using previously stored data");
        }
    }
    let store = cell.snapshot();

    if args.list_teams {
        for team in store.teams() {
            println!("{team}");
        }
        return Ok(());
    }
    if store.is_empty() {
        bail!("no match data available; run with --refresh, --csv, or the hist_ingest binary first");
    }

    let query = args.query()?;
    for team in [&query.home_team, &query.away_team] {
        if !store.contains_team(team) {
            bail!("unknown team {team:?}; run with --teams to list known names");
        }
    }
    let result = forecast(&store, &query, &cfg)?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("serialize forecast")?
        );
    } else {
        print!("{}", render_forecast(&result));
    }
    Ok(())
}

fn load_initial(args: &CliArgs) -> Result<Vec<MatchRecord>> {
    if !args.csv.is_empty() {
        let mut records = Vec::new();
        for path in &args.csv {
            let import = read_csv_file(path)?;
            info!(
                path = %path.display(),
                matches = import.records.len(),
                skipped = import.rows_skipped,
                "loaded csv"
            );
            records.extend(import.records);
        }
        return Ok(records);
    }
    let Some(path) = args.db_path() else {
        return Ok(Vec::new());
    };
    if !path.exists() {
        return Ok(Vec::new());
    }
    let conn = historical_db::open_db(&path)?;
    let records = historical_db::load_records(&conn)?;
    let last_ingest = historical_db::last_ingest_at(&conn)?;
    info!(
        path = %path.display(),
        matches = records.len(),
        last_ingest = last_ingest.as_deref().unwrap_or("never"),
        "loaded stored dataset"
    );
    Ok(records)
}

fn refresh(cell: &SnapshotCell, args: &CliArgs) -> Result<()> {
    let timeout = std::env::var("APP_REFRESH_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_REFRESH_TIMEOUT_SECS)
        .max(1);
    let plan = FetchPlan::from_env();
    let outcome: Arc<Mutex<Option<FetchSummary>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&outcome);

    let cancel = CancelToken::new();
    let store = cell.refresh(Duration::from_secs(timeout), &cancel, move |token| {
        let mut summary = fetch_all(&plan, &token)?;
        let records = std::mem::take(&mut summary.records);
        *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(summary);
        Ok(records)
    })?;

    if let Some(path) = args.db_path() {
        let mut conn = historical_db::open_db(&path)?;
        let stored = historical_db::replace_all(&mut conn, store.records())?;
        let summary = outcome.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(summary) = summary {
            historical_db::record_ingest_run(&conn, &summary, stored)?;
        }
    }
    Ok(())
}

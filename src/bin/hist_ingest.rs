use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use matchday_forecast::dataset_fetch::{FetchPlan, fetch_all};
use matchday_forecast::historical_db;
use matchday_forecast::store::CancelToken;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut plan = FetchPlan::from_env();
    if let Some(leagues) = parse_list_arg("--leagues") {
        plan.leagues = leagues;
    }
    if let Some(seasons) = parse_list_arg("--seasons") {
        plan.seasons = seasons;
    }
    if plan.leagues.is_empty() || plan.seasons.is_empty() {
        return Err(anyhow!("no leagues or seasons resolved for ingest"));
    }

    let db_path = parse_db_path_arg()
        .or_else(historical_db::default_db_path)
        .context("unable to resolve sqlite path")?;

    let summary = fetch_all(&plan, &CancelToken::new())?;
    if summary.records.is_empty() {
        return Err(anyhow!(
            "no matches downloaded ({} of {} sources failed); stored data left untouched",
            summary.errors.len(),
            summary.sources_total
        ));
    }

    let mut conn = historical_db::open_db(&db_path)?;
    let stored = historical_db::replace_all(&mut conn, &summary.records)?;
    historical_db::record_ingest_run(&conn, &summary, stored)?;

    println!("Historical ingest complete");
    println!("DB: {}", db_path.display());
    println!("Seasons: {:?}", plan.seasons);
    println!("Leagues: {:?}", plan.leagues);
    println!(
        "Sources: {}/{}",
        summary.sources_succeeded, summary.sources_total
    );
    println!("Matches stored: {stored}");
    println!("Rows skipped: {}", summary.rows_skipped);
    if !summary.errors.is_empty() {
        println!("  errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(6) {
            println!("   - {err}");
        }
    }

    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    parse_value_arg("--db").map(PathBuf::from)
}

fn parse_list_arg(flag: &str) -> Option<Vec<String>> {
    let raw = parse_value_arg(flag)?;
    let items = raw
        .split([',', ';', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    (!items.is_empty()).then_some(items)
}

fn parse_value_arg(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

use std::fs;
use std::path::PathBuf;

use anyhow::Context;

use matchday_forecast::config::ForecastConfig;
use matchday_forecast::forecast::{MatchQuery, forecast};
use matchday_forecast::match_record::MatchRecord;
use matchday_forecast::store::MatchRecordStore;

#[derive(Debug, serde::Deserialize)]
struct ForecastCase {
    #[serde(default)]
    config: ForecastConfig,
    query: MatchQuery,
    matches: Vec<MatchRecord>,
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/forecast_case.json"));

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read forecast case {}", path.display()))?;
    let case: ForecastCase = serde_json::from_str(&raw)
        .with_context(|| format!("parse forecast case {}", path.display()))?;

    // Offline: one case in, the full forecast out as JSON. Handy for golden files.
    let store = MatchRecordStore::new(case.matches);
    let result = forecast(&store, &case.query, &case.config)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

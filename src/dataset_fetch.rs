use std::env;

use anyhow::{Result, anyhow};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::csv_import::{CsvImport, parse_matches_csv};
use crate::http_client::{fetch_text, http_client};
use crate::match_record::MatchRecord;
use crate::store::CancelToken;

const FOOTBALL_DATA_BASE: &str = "https://www.football-data.co.uk/mmz4281";
pub const DEFAULT_SEASONS: &[&str] = &["2526", "2425", "2324"];
pub const DEFAULT_LEAGUES: &[&str] = &["SP1", "SP2", "E0", "E1", "I1", "D1", "F1", "P1"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub season: String,
    pub league: String,
}

impl Source {
    pub fn url(&self) -> String {
        format!("{FOOTBALL_DATA_BASE}/{}/{}.csv", self.season, self.league)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub seasons: Vec<String>,
    pub leagues: Vec<String>,
}

impl Default for FetchPlan {
    fn default() -> Self {
        Self {
            seasons: DEFAULT_SEASONS.iter().map(|s| s.to_string()).collect(),
            leagues: DEFAULT_LEAGUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FetchPlan {
    pub fn from_env() -> Self {
        let mut plan = Self::default();
        if let Some(seasons) = codes_from_env("APP_SEASONS") {
            plan.seasons = seasons;
        }
        if let Some(leagues) = codes_from_env("APP_LEAGUES") {
            plan.leagues = leagues;
        }
        plan
    }

    pub fn sources(&self) -> Vec<Source> {
        self.seasons
            .iter()
            .flat_map(|season| {
                self.leagues.iter().map(move |league| Source {
                    season: season.clone(),
                    league: league.clone(),
                })
            })
            .collect()
    }
}

fn codes_from_env(key: &str) -> Option<Vec<String>> {
    let raw = env::var(key).ok()?;
    let codes = parse_codes(&raw);
    (!codes.is_empty()).then_some(codes)
}

fn parse_codes(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let code = part.trim();
        if !code.is_empty() && !out.iter().any(|c| c == code) {
            out.push(code.to_string());
        }
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    pub records: Vec<MatchRecord>,
    pub sources_total: usize,
    pub sources_succeeded: usize,
    pub rows_skipped: usize,
    pub errors: Vec<String>,
}

pub fn fetch_all(plan: &FetchPlan, cancel: &CancelToken) -> Result<FetchSummary> {
    let client = http_client()?;
    let sources = plan.sources();
    let pool = build_fetch_pool();

    let results: Vec<(Source, Result<CsvImport>)> = with_fetch_pool(&pool, || {
        sources
            .par_iter()
            .map(|source| {
                if cancel.is_cancelled() {
                    return (source.clone(), Err(anyhow!("cancelled")));
                }
                let url = source.url();
                let parsed = fetch_text(client, &url).and_then(|body| parse_matches_csv(&body));
                (source.clone(), parsed)
            })
            .collect()
    });
    if cancel.is_cancelled() {
        return Err(anyhow!("dataset fetch cancelled"));
    }

    let mut summary = FetchSummary {
        sources_total: sources.len(),
        ..FetchSummary::default()
    };
    for (source, parsed) in results {
        match parsed {
            Ok(import) => {
                summary.sources_succeeded += 1;
                summary.rows_skipped += import.rows_skipped;
                summary.records.extend(import.records);
            }
            Err(err) => {
                warn!(url = %source.url(), error = %err, "source fetch failed");
                summary
                    .errors
                    .push(format!("{} {}: {err:#}", source.season, source.league));
            }
        }
    }
    info!(
        sources = summary.sources_total,
        succeeded = summary.sources_succeeded,
        matches = summary.records.len(),
        "dataset fetch finished"
    );
    Ok(summary)
}

fn build_fetch_pool() -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(fetch_parallelism())
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

fn fetch_parallelism() -> usize {
    env::var("FETCH_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(4)
        .clamp(1, 16)
}

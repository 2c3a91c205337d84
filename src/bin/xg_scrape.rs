//! Jednorázový scrape jednoho zápasu, výsledek jako JSON na stdout
//! Spustit: cargo run --bin xg-scrape -- <url> [--save]

use anyhow::{bail, Result};
use dotenv::dotenv;
use xgstat_live::fixture_db::{DbConfig, FixtureStore};
use std::env;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use xg_scraper::{ScraperConfig, XgScraper};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let save = args.iter().any(|a| a == "--save");
    let Some(url) = args.iter().find(|a| !a.starts_with("--")) else {
        bail!("usage: xg-scrape <match-url> [--save]");
    };

    let scraper = XgScraper::chrome(ScraperConfig::from_env())?;

    info!("🚀 Scraping {}", url);
    let started = Instant::now();
    let fixture = match scraper.scrape(url).await {
        Ok(f) => f,
        Err(e) => {
            warn!("Scrape failed after {:.1}s ({})", started.elapsed().as_secs_f64(), e.kind());
            return Err(e.into());
        }
    };
    info!(
        "⏱️  {:.1}s: {} {}-{} {} (xG {:.2}-{:.2}), GW{}, {} shots",
        started.elapsed().as_secs_f64(),
        fixture.home_team,
        fixture.home_score,
        fixture.away_score,
        fixture.away_team,
        fixture.home_xg,
        fixture.away_xg,
        fixture.gameweek,
        fixture.total_shots()
    );

    println!("{}", serde_json::to_string_pretty(&fixture)?);

    if save {
        let path = env::var("XG_DB_PATH").unwrap_or_else(|_| "data/xgstat.db".to_string());
        let mut store = FixtureStore::open(&DbConfig { path: path.clone() })?;
        store.save_fixture(&fixture)?;
        info!("💾 Saved fixture {} to {} ({} total)", fixture.id, path, store.count_fixtures()?);
    }

    Ok(())
}

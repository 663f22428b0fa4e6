use boat_scout::feed::FeedGenerator;
use boat_scout::scrapers::build_scrapers;
use boat_scout::store::ListingStore;
use boat_scout::{Config, Pipeline};
use chrono::Utc;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("⛵ Boat Scout - sailing boat feed");
    info!("{}", "=".repeat(60));
    info!("Run started: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));

    let config = Config::from_env()?;
    let scrapers = build_scrapers(&config)?;
    let pipeline = Pipeline::new(
        scrapers,
        ListingStore::new(&config.store_path),
        FeedGenerator::new(config.feed.clone(), config.feed_window),
        &config.feed_path,
    )
    .concurrent(config.concurrent);

    let report = match pipeline.run(Utc::now()).await {
        Ok(report) => report,
        Err(e) => {
            error!("❌ Fatal error: {:#}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    report.log_summary();
    info!("Run finished: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));

    if report.is_degraded() {
        warn!("⚠️  WARNING: All sites failed to scrape!");
        return Ok(ExitCode::FAILURE);
    }

    info!("✨ Scraper completed successfully!");
    Ok(ExitCode::SUCCESS)
}

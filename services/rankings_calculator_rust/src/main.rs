mod config;
mod report;
mod window;

use crate::config::{Config, OutputFormat};
use anyhow::{Context, Result};
use chrono::Utc;
use dotenv::dotenv;
use rugby_rankings_core::clients::WorldRugbyClient;
use rugby_rankings_core::{project_rankings, FixtureBatchCoordinator, HomeAdvantageResolver};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Rugby Rankings Calculator...");

    // Config
    let config = Config::from_env().context("Failed to load configuration")?;
    config.log_config();
    let policy = config.venue_policy()?;

    // Clients
    let client = Arc::new(WorldRugbyClient::with_config(config.client_config()));

    // Rankings
    let rankings = client
        .fetch_rankings(config.source, config.rankings_date)
        .await
        .with_context(|| format!("Failed to fetch {} rankings", config.source))?;
    if rankings.estimated {
        warn!(
            "Provider rankings were dated after the requested date; using {}",
            rankings.effective_label
        );
    }

    // Fixtures
    let now = Utc::now();
    let (from, to) = window::fixture_window(
        rankings.effective_date(),
        config.rankings_date.is_some(),
        now.date_naive(),
    );
    let records = client
        .fetch_all_fixtures(from, to)
        .await
        .with_context(|| format!("Failed to fetch fixtures from {} to {}", from, to))?;

    // Batch
    let coordinator = FixtureBatchCoordinator::new(client.clone(), HomeAdvantageResolver::new(policy));
    let batch = coordinator.process_all(records, &rankings, now).await;
    for fixture in batch.unresolved() {
        warn!(
            "Fixture {} kept default home advantage: venue could not be resolved",
            fixture.match_id.as_deref().unwrap_or("-")
        );
    }
    let projection = project_rankings(&rankings, &batch.fixtures);

    match config.output {
        OutputFormat::Table => print!("{}", report::format_table(&rankings, &batch, &projection)),
        OutputFormat::Json => println!(
            "{}",
            report::format_json(&rankings, &batch, &projection).context("Failed to encode report")?
        ),
    }

    info!(
        "Done: {} fixtures, {} team requests",
        batch.fixtures.len(),
        batch.requests_sent
    );
    Ok(())
}

use agroplant_scraper::config::ScraperConfig;
use agroplant_scraper::pipeline::build_scraper;
use agroplant_scraper::storage::{DatasetWriter, StorageManager, read_url_list, records_to_dataframe};
use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const DEFAULT_CONFIG_PATH: &str = "configs/agroplant.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var("SCRAPER_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = if Path::new(&config_path).exists() {
        ScraperConfig::from_file(&config_path)?
    } else {
        warn!("Config file not found: {}, using built-in defaults", config_path);
        ScraperConfig::default()
    };

    info!(
        "🚀 Starting {} scraper (rules {}, {:?} mode)",
        config.site.name, config.rules.version, config.scraping.mode
    );

    let urls = read_url_list(Path::new(&config.input.path), &config.input.url_column)
        .context("Failed to load product URLs")?;

    if urls.is_empty() {
        warn!("No URLs to scrape in {}", config.input.path);
        return Ok(());
    }

    let scraper = build_scraper(&config).context("Failed to initialize scraper")?;

    // Ctrl-C stops the batch but still exports what was collected
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing with partial results");
            trigger.cancel();
        }
    });

    let outcome = scraper.run_until_cancelled(&urls, cancel).await;

    if outcome.records.is_empty() {
        error!("❌ No product pages could be scraped");
    }

    let mut df = records_to_dataframe(&outcome.records)?;
    let output_path = StorageManager::new(&config.output.dir)
        .dataset_path(&config.site.name, config.output.format);

    DatasetWriter::new(config.output.format)
        .write(&mut df, &output_path)
        .context("Failed to export dataset")?;

    info!(
        "🎉 Saved {} of {} products to {}",
        outcome.summary.emitted,
        outcome.summary.requested,
        output_path.display()
    );

    Ok(())
}

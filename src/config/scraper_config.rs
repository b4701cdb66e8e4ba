use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::rules::RuleSet;

/// Configuration for the product page harvester
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub site: SiteConfig,
    pub scraping: ScrapingConfig,
    pub headers: HeaderConfig,
    pub rules: RuleSet,
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// Basic site information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
}

/// Fetch and scheduling behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub timeout_seconds: u64,
    pub mode: ScrapeMode,
    /// Upper bound on in-flight pipelines for the concurrent mode.
    pub max_concurrency: Option<usize>,
    /// Sort records back into input order after a concurrent run.
    pub preserve_order: bool,
    /// Seed for user agent selection; random when unset.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeMode {
    #[default]
    Concurrent,
    Sequential,
}

/// Request identity: fixed headers plus a pool of user agents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub base: BTreeMap<String, String>,
    pub user_agents: Vec<String>,
}

/// Where the URL list comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub path: String,
    pub url_column: String,
}

/// Where and how the dataset is written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    pub format: ExportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Csv,
    Parquet,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
            ExportFormat::Json => "ndjson",
        }
    }
}

impl ScraperConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scraper config file: {}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse scraper config file: {}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ScraperConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scraping.max_retries == 0 {
            return Err(anyhow!("scraping.max_retries must be at least 1"));
        }

        if self.scraping.timeout_seconds == 0 {
            return Err(anyhow!("scraping.timeout_seconds must be positive"));
        }

        if self.scraping.max_concurrency == Some(0) {
            return Err(anyhow!("scraping.max_concurrency must be positive when set"));
        }

        if self.input.url_column.trim().is_empty() {
            return Err(anyhow!("input.url_column cannot be empty"));
        }

        Ok(())
    }
}

impl ScrapingConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "agroplant".to_string(),
            base_url: "https://agroplant.com.ua/uk/".to_string(),
        }
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 5000,
            timeout_seconds: 30,
            mode: ScrapeMode::Concurrent,
            max_concurrency: None,
            preserve_order: false,
            seed: None,
        }
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        let base = [
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
            ("Accept-Language", "uk-UA,uk;q=0.9,ru;q=0.8,en-US;q=0.7,en;q=0.6"),
            ("Connection", "keep-alive"),
            ("Upgrade-Insecure-Requests", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let user_agents = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.51",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self { base, user_agents }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: "urls.csv".to_string(),
            url_column: "Ссылки".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "output".to_string(),
            format: ExportFormat::Csv,
        }
    }
}

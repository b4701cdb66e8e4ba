pub mod concurrent;
pub mod sequential;

use anyhow::Result;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{RuleSet, ScrapeMode, ScraperConfig};
use crate::fetcher::{HeaderPool, HttpFetcher, PageFetcher, RetryPolicy};
use crate::models::ProductRecord;
use crate::processor::{FieldExtractor, PageValidator};

pub use concurrent::{ConcurrencyOptions, ConcurrentScraper};
pub use sequential::SequentialScraper;

/// A strategy for turning a list of product URLs into records.
#[async_trait]
pub trait Scraper: Send + Sync {
    fn mode(&self) -> ScrapeMode;

    /// Fetch one page; `None` means the URL should be skipped.
    async fn fetch(&self, url: &str) -> Option<String>;

    /// Process `urls` until done or until `cancel` fires, returning whatever
    /// was collected by then.
    async fn run_until_cancelled(&self, urls: &[String], cancel: CancellationToken)
    -> BatchOutcome;

    async fn run(&self, urls: &[String]) -> Vec<ProductRecord> {
        self.run_until_cancelled(urls, CancellationToken::new())
            .await
            .records
    }
}

/// Fetch, validate and extract for a single URL.
#[derive(Clone)]
pub struct PagePipeline {
    fetcher: Arc<dyn PageFetcher>,
    validator: Arc<PageValidator>,
    extractor: Arc<FieldExtractor>,
}

impl PagePipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        validator: PageValidator,
        extractor: FieldExtractor,
    ) -> Self {
        Self {
            fetcher,
            validator: Arc::new(validator),
            extractor: Arc::new(extractor),
        }
    }

    pub fn from_rules(fetcher: Arc<dyn PageFetcher>, rules: &RuleSet) -> Result<Self> {
        Ok(Self::new(
            fetcher,
            PageValidator::new(rules)?,
            FieldExtractor::new(rules)?,
        ))
    }

    pub async fn fetch(&self, url: &str) -> Option<String> {
        self.fetcher.fetch(url).await
    }

    pub async fn process(&self, url: &str) -> Option<ProductRecord> {
        let document = self.fetcher.fetch(url).await?;
        self.extract(url, &document)
    }

    /// Validate and extract an already fetched document.
    pub fn extract(&self, url: &str, document: &str) -> Option<ProductRecord> {
        let page = self.validator.validate(url, document)?;
        Some(self.extractor.extract_all(&page))
    }
}

/// Counters for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub requested: usize,
    pub emitted: usize,
    /// Fetch failures and validation rejections.
    pub skipped: usize,
    /// Pipelines that panicked.
    pub crashed: usize,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Self::default()
        }
    }

    /// URLs that never finished because the batch was cancelled.
    pub fn abandoned(&self) -> usize {
        self.requested
            .saturating_sub(self.emitted + self.skipped + self.crashed)
    }

    pub fn log(&self) {
        info!(
            "📊 Batch finished: {} requested, {} records, {} skipped, {} crashed, {} abandoned",
            self.requested,
            self.emitted,
            self.skipped,
            self.crashed,
            self.abandoned()
        );
    }
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<ProductRecord>,
    pub summary: BatchSummary,
}

/// Wire up the HTTP fetcher and the configured strategy.
pub fn build_scraper(config: &ScraperConfig) -> Result<Box<dyn Scraper>> {
    let headers = HeaderPool::new(&config.headers, config.scraping.seed);
    let fetcher = HttpFetcher::new(RetryPolicy::from_config(&config.scraping), headers)?;
    let pipeline = PagePipeline::from_rules(Arc::new(fetcher), &config.rules)?;

    Ok(scraper_for_mode(
        config.scraping.mode,
        pipeline,
        ConcurrencyOptions {
            max_concurrency: config.scraping.max_concurrency,
            preserve_order: config.scraping.preserve_order,
        },
    ))
}

pub fn scraper_for_mode(
    mode: ScrapeMode,
    pipeline: PagePipeline,
    options: ConcurrencyOptions,
) -> Box<dyn Scraper> {
    match mode {
        ScrapeMode::Concurrent => Box::new(ConcurrentScraper::new(pipeline, options)),
        ScrapeMode::Sequential => Box::new(SequentialScraper::new(pipeline)),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

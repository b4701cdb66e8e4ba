use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::ScrapeMode;
use crate::pipeline::{BatchOutcome, BatchSummary, PagePipeline, Scraper, panic_message};

/// Processes URLs one at a time, in input order.
pub struct SequentialScraper {
    pipeline: PagePipeline,
}

impl SequentialScraper {
    pub fn new(pipeline: PagePipeline) -> Self {
        Self { pipeline }
    }

    async fn run_batch(&self, urls: &[String], cancel: CancellationToken) -> BatchOutcome {
        let mut summary = BatchSummary::new(urls.len());
        let mut records = Vec::new();

        for (position, url) in urls.iter().enumerate() {
            info!("Processing page {} of {}: {}", position + 1, urls.len(), url);

            let outcome = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    warn!("Batch cancelled before {}", url);
                    summary.cancelled = true;
                    break;
                }
                outcome = AssertUnwindSafe(self.pipeline.process(url)).catch_unwind() => outcome,
            };

            match outcome {
                Ok(Some(record)) => {
                    info!("✅ Extracted {}", record.url);
                    summary.emitted += 1;
                    records.push(record);
                }
                Ok(None) => summary.skipped += 1,
                Err(payload) => {
                    error!("❌ Pipeline for {} crashed: {}", url, panic_message(&*payload));
                    summary.crashed += 1;
                }
            }
        }

        summary.log();
        BatchOutcome { records, summary }
    }
}

#[async_trait]
impl Scraper for SequentialScraper {
    fn mode(&self) -> ScrapeMode {
        ScrapeMode::Sequential
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        self.pipeline.fetch(url).await
    }

    async fn run_until_cancelled(
        &self,
        urls: &[String],
        cancel: CancellationToken,
    ) -> BatchOutcome {
        let span = info_span!("scrape_batch", run_id = %Uuid::new_v4(), mode = "sequential");
        self.run_batch(urls, cancel).instrument(span).await
    }
}

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::ScrapeMode;
use crate::models::ProductRecord;
use crate::pipeline::{BatchOutcome, BatchSummary, PagePipeline, Scraper};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConcurrencyOptions {
    /// `None` launches every pipeline at once.
    pub max_concurrency: Option<usize>,
    /// Restore input order; otherwise records arrive in completion order.
    pub preserve_order: bool,
}

/// Runs one tokio task per URL over the shared connection pool.
pub struct ConcurrentScraper {
    pipeline: PagePipeline,
    options: ConcurrencyOptions,
}

impl ConcurrentScraper {
    pub fn new(pipeline: PagePipeline, options: ConcurrencyOptions) -> Self {
        Self { pipeline, options }
    }

    fn spawn_all(&self, urls: &[String]) -> Vec<JoinHandle<Option<ProductRecord>>> {
        let limiter = self
            .options
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        urls.iter()
            .map(|url| {
                let pipeline = self.pipeline.clone();
                let limiter = limiter.clone();
                let url = url.clone();

                tokio::spawn(async move {
                    let _permit = match limiter {
                        Some(limiter) => Some(limiter.acquire_owned().await.ok()?),
                        None => None,
                    };
                    pipeline.process(&url).await
                })
            })
            .collect()
    }

    async fn run_batch(&self, urls: &[String], cancel: CancellationToken) -> BatchOutcome {
        info!("🚀 Launching {} page pipelines", urls.len());

        let handles = self.spawn_all(urls);
        let abort_handles: Vec<AbortHandle> = handles.iter().map(JoinHandle::abort_handle).collect();
        let mut pending: FuturesUnordered<_> = handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| async move { (index, handle.await) })
            .collect();

        let mut summary = BatchSummary::new(urls.len());
        let mut collected = Vec::new();

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    warn!("Batch cancelled, abandoning {} in-flight pages", pending.len());
                    for handle in &abort_handles {
                        handle.abort();
                    }
                    summary.cancelled = true;
                    break;
                }
                next = pending.next() => match next {
                    Some((index, Ok(Some(record)))) => {
                        info!("✅ Extracted {}", record.url);
                        summary.emitted += 1;
                        collected.push((index, record));
                    }
                    Some((_, Ok(None))) => summary.skipped += 1,
                    Some((index, Err(e))) => {
                        error!("❌ Pipeline for {} crashed: {}", urls[index], e);
                        summary.crashed += 1;
                    }
                    None => break,
                },
            }
        }

        if self.options.preserve_order {
            collected.sort_by_key(|(index, _)| *index);
        }

        summary.log();
        BatchOutcome {
            records: collected.into_iter().map(|(_, record)| record).collect(),
            summary,
        }
    }
}

#[async_trait]
impl Scraper for ConcurrentScraper {
    fn mode(&self) -> ScrapeMode {
        ScrapeMode::Concurrent
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        self.pipeline.fetch(url).await
    }

    async fn run_until_cancelled(
        &self,
        urls: &[String],
        cancel: CancellationToken,
    ) -> BatchOutcome {
        let span = info_span!("scrape_batch", run_id = %Uuid::new_v4(), mode = "concurrent");
        self.run_batch(urls, cancel).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::*;
    use std::collections::HashSet;
    use std::time::Duration;

    fn concurrent_scraper(fetcher: StaticFetcher, options: ConcurrencyOptions) -> ConcurrentScraper {
        ConcurrentScraper::new(pipeline(Arc::new(fetcher)), options)
    }

    #[tokio::test]
    async fn test_only_valid_pages_become_records() {
        let fetcher = StaticFetcher::default()
            .page("https://a/1", product_page("Один"))
            .page("https://a/2", product_page("Два"))
            .page("https://a/3", category_page())
            .page("https://a/5", product_page("П'ять"));
        let scraper = concurrent_scraper(fetcher, ConcurrencyOptions::default());

        let outcome = scraper
            .run_until_cancelled(
                &urls(&["https://a/1", "https://a/2", "https://a/3", "https://a/4", "https://a/5"]),
                CancellationToken::new(),
            )
            .await;

        let got: HashSet<&str> = outcome.records.iter().map(|r| r.url.as_str()).collect();
        let expected: HashSet<&str> = ["https://a/1", "https://a/2", "https://a/5"].into_iter().collect();
        assert_eq!(got, expected);
        assert_eq!(outcome.summary.emitted, 3);
        assert_eq!(outcome.summary.skipped, 2);
        assert!(!outcome.summary.cancelled);
    }

    #[tokio::test]
    async fn test_crashing_pipeline_does_not_abort_batch() {
        let fetcher = StaticFetcher::default()
            .page("https://a/1", product_page("Один"))
            .page("https://a/2", product_page("Два"))
            .page("https://a/3", product_page("Три"))
            .panic_on("https://a/2");
        let scraper = concurrent_scraper(fetcher, ConcurrencyOptions::default());

        let outcome = scraper
            .run_until_cancelled(&urls(&["https://a/1", "https://a/2", "https://a/3"]), CancellationToken::new())
            .await;

        let mut got: Vec<&str> = outcome.records.iter().map(|r| r.url.as_str()).collect();
        got.sort();
        assert_eq!(got, vec!["https://a/1", "https://a/3"]);
        assert_eq!(outcome.summary.crashed, 1);
        assert!(outcome.records.iter().all(|r| r.known_fields() == 2));
    }

    #[tokio::test]
    async fn test_preserve_order_sorts_by_input_index() {
        // Later URLs finish first
        let fetcher = StaticFetcher::default()
            .page("https://a/1", product_page("Один"))
            .page("https://a/2", product_page("Два"))
            .page("https://a/3", product_page("Три"))
            .delay("https://a/1", Duration::from_millis(150))
            .delay("https://a/2", Duration::from_millis(75));
        let scraper = concurrent_scraper(
            fetcher,
            ConcurrencyOptions {
                max_concurrency: None,
                preserve_order: true,
            },
        );

        let records = scraper.run(&urls(&["https://a/1", "https://a/2", "https://a/3"])).await;
        let got: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(got, vec!["https://a/1", "https://a/2", "https://a/3"]);
    }

    #[tokio::test]
    async fn test_bounded_concurrency_processes_everything() {
        let mut fetcher = StaticFetcher::default();
        let all: Vec<String> = (0..20).map(|i| format!("https://a/{}", i)).collect();
        for url in &all {
            fetcher = fetcher
                .page(url, product_page(url))
                .delay(url, Duration::from_millis(5));
        }
        let fetcher = Arc::new(fetcher);
        let scraper = ConcurrentScraper::new(
            pipeline(fetcher.clone()),
            ConcurrencyOptions {
                max_concurrency: Some(3),
                preserve_order: false,
            },
        );

        let records = scraper.run(&all).await;
        assert_eq!(records.len(), 20);
        assert_eq!(fetcher.call_count(), 20);
    }

    #[tokio::test]
    async fn test_cancellation_returns_partial_results() {
        let fetcher = StaticFetcher::default()
            .page("https://a/fast", product_page("Швидкий"))
            .page("https://a/slow", product_page("Повільний"))
            .delay("https://a/slow", Duration::from_secs(60));
        let scraper = concurrent_scraper(fetcher, ConcurrencyOptions::default());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let outcome = scraper
            .run_until_cancelled(&urls(&["https://a/fast", "https://a/slow"]), cancel)
            .await;

        assert!(outcome.summary.cancelled);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].url, "https://a/fast");
        assert_eq!(outcome.summary.abandoned(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let scraper = concurrent_scraper(StaticFetcher::default(), ConcurrencyOptions::default());
        let outcome = scraper.run_until_cancelled(&[], CancellationToken::new()).await;
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.summary, BatchSummary::new(0));
    }
}

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

use crate::config::ScrapingConfig;
use crate::fetcher::{FetchError, HeaderPool, PageFetcher};
use crate::models::FetchResult;

/// Retry bounds for a single URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts for transport failures.
    pub retries: usize,
    pub delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ScrapingConfig) -> Self {
        Self {
            retries: config.max_retries,
            delay: config.retry_delay(),
            timeout: config.timeout(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ScrapingConfig::default())
    }
}

/// GET-only fetcher with rotating identity and bounded retries
pub struct HttpFetcher {
    client: Client,
    headers: HeaderPool,
    policy: RetryPolicy,
}

enum Attempt {
    Document(String),
    Failed(FetchError),
}

impl HttpFetcher {
    pub fn new(policy: RetryPolicy, headers: HeaderPool) -> Result<Self> {
        let client = Client::builder()
            .emulation(Emulation::Firefox136)
            .timeout(policy.timeout)
            .build()?;

        Ok(HttpFetcher {
            client,
            headers,
            policy,
        })
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch a page, keeping the reason when nothing came back
    pub async fn fetch_detailed(&self, url: &str) -> FetchResult {
        // One identity per URL, reused across its retries
        let headers = self.headers.identity();
        let attempts = self.policy.retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.fetch_once(url, &headers).await {
                Attempt::Document(html) => {
                    debug!("Fetched {} characters from {}", html.len(), url);
                    return FetchResult::success(url, html);
                }
                Attempt::Failed(FetchError::Rejected { status }) => {
                    warn!(
                        "Skipping {} due to invalid response or status code: {}",
                        url, status
                    );
                    return FetchResult::failure(url, FetchError::Rejected { status });
                }
                Attempt::Failed(FetchError::Transport { message, .. }) => {
                    warn!("Attempt {} failed for {}: {}", attempt, url, message);
                    last_error = message;
                    if attempt < attempts {
                        sleep(self.policy.delay).await;
                    }
                }
            }
        }

        info!("Giving up on {} after {} attempts", url, attempts);
        FetchResult::failure(
            url,
            FetchError::Transport {
                attempts,
                message: last_error,
            },
        )
    }

    async fn fetch_once(&self, url: &str, headers: &[(String, String)]) -> Attempt {
        let mut request = self.client.get(url);
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Failed(transport(e)),
        };

        let status = response.status().as_u16();
        if status != 200 {
            return Attempt::Failed(FetchError::Rejected { status });
        }

        match response.text().await {
            Ok(html) => Attempt::Document(html),
            Err(e) => Attempt::Failed(transport(e)),
        }
    }
}

fn transport(error: wreq::Error) -> FetchError {
    FetchError::Transport {
        attempts: 1,
        message: error.to_string(),
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        self.fetch_detailed(url).await.document
    }
}

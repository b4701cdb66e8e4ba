pub mod error;
pub mod headers;
pub mod http_fetcher;

use async_trait::async_trait;

pub use error::FetchError;
pub use headers::HeaderPool;
pub use http_fetcher::{HttpFetcher, RetryPolicy};

/// Source of raw product page markup.
///
/// `None` means "skip this URL"; implementations absorb their own failures.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<String>;
}

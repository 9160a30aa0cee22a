use crate::error::Result;
use async_trait::async_trait;
use url::Url;

/// A downloaded page, delivered regardless of status code
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against it
    pub url: Url,
    pub status: u16,
    pub body: String,
}

/// Fetch layer behind the crawl driver.
/// Lets the driver run against the live site or against canned pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page, applying whatever retry policy the fetcher carries
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;

    /// Get the name of the fetch backend
    fn source_name(&self) -> &'static str;
}

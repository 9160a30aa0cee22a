use crate::error::Result;
use crate::models::SearchRequest;
use crate::queue::QueryQueue;
use crate::scrapers::amazon::{build_search_request, Extracted, ListingPage};
use crate::scrapers::traits::{FetchedPage, PageFetcher};
use crate::storage::{JsonPersister, ScrapeCounters};
use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

const LOG_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// What a finished run looked like
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub queries_dispatched: u64,
    pub items_scraped: u64,
    pub items_skipped: u64,
    pub pages_failed: u64,
    pub started_at: DateTime<Local>,
    pub stopped_at: DateTime<Local>,
}

/// Pulls keywords off the queue one at a time and runs each search to completion
pub struct CrawlDriver<F: PageFetcher> {
    fetcher: F,
    queue: QueryQueue,
    persister: JsonPersister,
    base_url: String,
    counters: ScrapeCounters,
    queries_dispatched: u64,
    items_skipped: u64,
    pages_failed: u64,
}

impl<F: PageFetcher> CrawlDriver<F> {
    pub fn new(fetcher: F, queue: QueryQueue, persister: JsonPersister, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            queue,
            persister,
            base_url: base_url.into(),
            counters: ScrapeCounters::default(),
            queries_dispatched: 0,
            items_skipped: 0,
            pages_failed: 0,
        }
    }

    /// Drain the queue. Only a malformed base URL stops the run early.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let started_at = Local::now();
        info!("[INIT] Script started at {}", started_at.format(LOG_TIME_FORMAT));
        info!("Fetching through {} with {} queued keywords", self.fetcher.source_name(), self.queue.len());
        if self.queue.is_empty() {
            warn!("No search keywords to scrape");
        }

        while let Some(request) = self.on_idle()? {
            self.dispatch(&request).await;
        }

        let summary = RunSummary {
            queries_dispatched: self.queries_dispatched,
            items_scraped: self.counters.total,
            items_skipped: self.items_skipped,
            pages_failed: self.pages_failed,
            started_at,
            stopped_at: Local::now(),
        };
        log_summary(&summary);

        Ok(summary)
    }

    /// Called whenever nothing is in flight. Returns the next search to run,
    /// or `None` once the queue is drained.
    pub fn on_idle(&mut self) -> Result<Option<SearchRequest>> {
        let Some(query) = self.queue.pop_next() else {
            return Ok(None);
        };

        self.counters.start_query();
        self.queries_dispatched += 1;
        info!("Search Keyword: {} now start scraping", query);

        build_search_request(&self.base_url, &query).map(Some)
    }

    async fn dispatch(&mut self, request: &SearchRequest) {
        match self.fetcher.fetch(&request.url).await {
            Ok(page) => self.handle_listing(&page, &request.query),
            Err(e) => {
                self.pages_failed += 1;
                error!("Error in listing Page URL: {}: {}", request.url, e);
            }
        }
    }

    /// Parse one listing page and persist each titled product.
    /// The first extraction error abandons the rest of the page.
    fn handle_listing(&mut self, page: &FetchedPage, query: &str) {
        if page.status >= 400 {
            warn!("Listing page {} answered {}", page.url, page.status);
        }

        let listing = ListingPage::parse(page);
        for extracted in listing.products() {
            match extracted {
                Ok(Extracted::Product(record)) => {
                    debug!("{:?}", record);
                    if let Err(e) = self.persister.append(&record, query, &mut self.counters) {
                        error!("Error in json Writing File: {}", e);
                    }
                }
                Ok(Extracted::Skipped(partial)) => {
                    self.items_skipped += 1;
                    warn!("Skipping incomplete item URL: {} item: {:?}", listing.url(), partial);
                }
                Err(e) => {
                    self.pages_failed += 1;
                    error!("Error in listing Page URL: {}: {}", listing.url(), e);
                    break;
                }
            }
        }
    }
}

fn log_summary(summary: &RunSummary) {
    info!("Scraper started at: {}", summary.started_at.format(LOG_TIME_FORMAT));
    info!("Scraper stopped at: {}", summary.stopped_at.format(LOG_TIME_FORMAT));
    info!("Scraper closed: finished");
    info!("Total queries dispatched: {}", summary.queries_dispatched);
    info!("Total items scraped: {}", summary.items_scraped);
}

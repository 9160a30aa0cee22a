mod driver;
mod error;
mod logging;
mod models;
mod queue;
mod scrapers;
mod storage;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use driver::CrawlDriver;
use queue::QueryQueue;
use scrapers::{HttpFetcher, ScrapeSettings};
use std::path::PathBuf;
use std::time::Duration;
use storage::JsonPersister;
use tracing::{error, info};

/// Search Amazon for each keyword in the input file and save the listings as JSON
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON array of search keywords
    #[arg(short, long, default_value = "input/user_queries.json")]
    input: PathBuf,

    /// Directory for the per-keyword JSON files
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Directory for the per-run log file
    #[arg(short, long, default_value = "logs")]
    logs_dir: PathBuf,

    #[arg(long, default_value = "https://www.amazon.com")]
    base_url: String,

    /// Retries per request on a retryable status code
    #[arg(long, default_value_t = 5)]
    retry_times: u32,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl Args {
    fn into_settings(self) -> ScrapeSettings {
        let mut settings = ScrapeSettings {
            base_url: self.base_url,
            input_file: self.input,
            output_dir: self.output_dir,
            logs_dir: self.logs_dir,
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..ScrapeSettings::default()
        };
        settings.retry.max_retries = self.retry_times;
        settings
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Args::parse().into_settings();
    let started_at = Local::now();

    for dir in [&settings.output_dir, &settings.logs_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    // Initialize logging
    let log_path = logging::log_file_path(&settings.logs_dir, started_at);
    logging::init(&log_path)?;

    info!("🛒 Amazon Scout - search listing scraper");
    info!("Logging to {}", log_path.display());

    let queue = match QueryQueue::load(&settings.input_file) {
        Ok(queue) => queue,
        Err(e) => {
            error!("An error occurred while reading the input file: {}", e);
            return Err(e.into());
        }
    };

    let fetcher = HttpFetcher::new(&settings)?;
    let persister = JsonPersister::new(&settings.output_dir);
    let mut driver = CrawlDriver::new(fetcher, queue, persister, settings.base_url.clone());

    let summary = driver.run().await?;
    info!(
        "✅ Scraped {} items across {} keywords ({} skipped, {} failed pages)",
        summary.items_scraped, summary.queries_dispatched, summary.items_skipped, summary.pages_failed
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_standard_layout() {
        let settings = Args::parse_from(["amazon-scout"]).into_settings();

        assert_eq!(settings.input_file, PathBuf::from("input/user_queries.json"));
        assert_eq!(settings.output_dir, PathBuf::from("output"));
        assert_eq!(settings.logs_dir, PathBuf::from("logs"));
        assert_eq!(settings.base_url, "https://www.amazon.com");
        assert_eq!(settings.retry.max_retries, 5);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn flags_override_settings() {
        let settings = Args::parse_from([
            "amazon-scout",
            "--input",
            "queries.json",
            "--base-url",
            "https://www.amazon.co.uk",
            "--retry-times",
            "2",
        ])
        .into_settings();

        assert_eq!(settings.input_file, PathBuf::from("queries.json"));
        assert_eq!(settings.base_url, "https://www.amazon.co.uk");
        assert_eq!(settings.retry.max_retries, 2);
        assert_eq!(settings.retry.retry_codes.len(), 8);
    }
}

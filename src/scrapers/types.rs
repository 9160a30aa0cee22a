use std::path::PathBuf;
use std::time::Duration;

/// Status codes that trigger a retry before the page is handed to the parser
pub const RETRY_HTTP_CODES: [u16; 8] = [500, 502, 503, 504, 400, 403, 404, 408];

/// Declarative retry policy applied by the fetch layer
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Status codes worth another attempt
    pub retry_codes: Vec<u16>,
    /// First backoff delay; doubles on every retry
    pub base_delay: Duration,
    /// Upper bound on a single backoff delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn should_retry_status(&self, status: u16, attempt: u32) -> bool {
        attempt < self.max_retries && self.retry_codes.contains(&status)
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_codes: RETRY_HTTP_CODES.to_vec(),
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

/// Runtime settings for a scrape run
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    /// Site root; searches go to `{base_url}/s?k=...`
    pub base_url: String,
    /// JSON array of keywords
    pub input_file: PathBuf,
    /// One `{query}.json` per keyword lands here
    pub output_dir: PathBuf,
    /// Per-run log files
    pub logs_dir: PathBuf,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.amazon.com".to_string(),
            input_file: PathBuf::from("input/user_queries.json"),
            output_dir: PathBuf::from("output"),
            logs_dir: PathBuf::from("logs"),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_retries_listed_codes_five_times() {
        let policy = RetryPolicy::default();

        for code in [400, 403, 404, 408, 500, 502, 503, 504] {
            assert!(policy.should_retry_status(code, 0));
            assert!(policy.should_retry_status(code, 4));
            assert!(!policy.should_retry_status(code, 5));
        }
        assert!(!policy.should_retry_status(200, 0));
        assert!(!policy.should_retry_status(429, 0));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(10), Duration::from_secs(8));
    }
}

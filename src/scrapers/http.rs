use crate::error::{Result, ScrapeError};
use crate::scrapers::traits::{FetchedPage, PageFetcher};
use crate::scrapers::types::{RetryPolicy, ScrapeSettings};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

/// Browser fingerprint sent with every search request
const FINGERPRINT_HEADERS: &[(&str, &str)] = &[
    ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7"),
    ("accept-language", "en-PK,en;q=0.9,ur-PK;q=0.8,ur;q=0.7,en-US;q=0.6"),
    ("device-memory", "8"),
    ("downlink", "0.15"),
    ("dpr", "1.25"),
    ("ect", "3g"),
    ("priority", "u=0, i"),
    ("referer", "https://www.amazon.com"),
    ("rtt", "550"),
    ("sec-ch-device-memory", "8"),
    ("sec-ch-dpr", "1.25"),
    ("sec-ch-ua", "\"Google Chrome\";v=\"131\", \"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\""),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("sec-ch-ua-platform-version", "\"10.0.0\""),
    ("sec-ch-viewport-width", "1536"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "same-origin"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
    ("user-agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"),
    ("viewport-width", "1536"),
];

pub fn fingerprint_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(FINGERPRINT_HEADERS.len());
    for &(name, value) in FINGERPRINT_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

/// Live fetcher backed by reqwest
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(settings: &ScrapeSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .default_headers(fingerprint_headers())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            retry: settings.retry.clone(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        let mut attempt = 0;

        loop {
            debug!("Fetching URL: {} (attempt {})", url, attempt + 1);

            match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if self.retry.should_retry_status(status, attempt) {
                        warn!(
                            "Retrying {} (status {}), retry {}/{}",
                            url,
                            status,
                            attempt + 1,
                            self.retry.max_retries
                        );
                    } else {
                        // Every status is handed over, retry budget spent or not
                        let final_url = response.url().clone();
                        let body = response.text().await.map_err(|source| ScrapeError::Http {
                            url: url.to_string(),
                            source,
                        })?;
                        debug!("Downloaded {} bytes from {} ({})", body.len(), final_url, status);

                        return Ok(FetchedPage {
                            url: final_url,
                            status,
                            body,
                        });
                    }
                }
                Err(source) => {
                    if attempt >= self.retry.max_retries {
                        return Err(ScrapeError::Http {
                            url: url.to_string(),
                            source,
                        });
                    }
                    warn!(
                        "Retrying {} ({}), retry {}/{}",
                        url,
                        source,
                        attempt + 1,
                        self.retry.max_retries
                    );
                }
            }

            tokio::time::sleep(self.retry.delay_for(attempt)).await;
            attempt += 1;
        }
    }

    fn source_name(&self) -> &'static str {
        "Amazon"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use reqwest::header::USER_AGENT;
    use std::time::Duration;

    fn fast_retry_fetcher(max_retries: u32) -> HttpFetcher {
        let mut settings = ScrapeSettings::default();
        settings.request_timeout = Duration::from_secs(5);
        settings.retry.max_retries = max_retries;
        settings.retry.base_delay = Duration::from_millis(1);
        settings.retry.max_delay = Duration::from_millis(1);
        HttpFetcher::new(&settings).unwrap()
    }

    #[test]
    fn fingerprint_includes_browser_identity() {
        let headers = fingerprint_headers();

        assert_eq!(headers.len(), FINGERPRINT_HEADERS.len());
        assert!(headers[USER_AGENT].to_str().unwrap().contains("Chrome/131"));
        assert_eq!(headers["sec-fetch-mode"], "navigate");
    }

    #[test]
    fn builds_from_default_settings() {
        let fetcher = HttpFetcher::new(&ScrapeSettings::default()).unwrap();
        assert_eq!(fetcher.retry.max_retries, 5);
        assert_eq!(fetcher.source_name(), "Amazon");
    }

    #[tokio::test]
    async fn retryable_status_is_retried_then_handed_over() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/s")
            .with_status(503)
            .with_body("<html>busy</html>")
            .expect(6)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/s", server.url())).unwrap();
        let page = fast_retry_fetcher(5).fetch(&url).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.status, 503);
        assert_eq!(page.body, "<html>busy</html>");
    }

    #[tokio::test]
    async fn success_is_fetched_once() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/s")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html>results</html>")
            .expect(1)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/s", server.url())).unwrap();
        let page = fast_retry_fetcher(5).fetch(&url).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html>results</html>");
        assert_eq!(page.url, url);
    }

    #[tokio::test]
    async fn unlisted_status_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/s")
            .with_status(429)
            .with_body("slow down")
            .expect(1)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/s", server.url())).unwrap();
        let page = fast_retry_fetcher(5).fetch(&url).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.status, 429);
    }

    #[tokio::test]
    async fn refused_connection_becomes_http_error() {
        // Grab a free port, then close it so nothing is listening there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{}/s", port)).unwrap();

        let err = fast_retry_fetcher(2).fetch(&url).await.unwrap_err();

        match err {
            ScrapeError::Http { url: failed, .. } => assert_eq!(failed, url.to_string()),
            other => panic!("expected an HTTP error, got {:?}", other),
        }
    }
}

//! Markup fetching.
//!
//! [`Fetch`] is the seam between the pipeline and the network. [`HttpFetcher`]
//! is the real implementation; [`Throttled`] decorates any fetcher with the
//! fixed politeness delay so listing pages and post pages are spaced evenly.

use crate::error::FetchError;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument};

/// Retrieve raw markup for a URL.
pub trait Fetch {
    /// Fetch `url` once. Non-success statuses are errors; there are no retries.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}

/// Plain GET requests with a browser-like identity.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client that presents `user_agent` and asks for HTML.
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        debug!(bytes = body.len(), "Fetched markup");
        Ok(body)
    }
}

/// Waits a fixed delay before every fetch except the first.
///
/// One instance is created per digest build, so independent builds never
/// share pacing state.
#[derive(Debug)]
pub struct Throttled<F> {
    inner: F,
    delay: Duration,
    started: AtomicBool,
}

impl<F: Fetch> Throttled<F> {
    pub fn new(inner: F, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            started: AtomicBool::new(false),
        }
    }
}

impl<F: Fetch> Fetch for Throttled<F> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if self.started.swap(true, Ordering::SeqCst) && !self.delay.is_zero() {
            debug!(delay_ms = self.delay.as_millis() as u64, "Politeness delay");
            sleep(self.delay).await;
        }
        self.inner.fetch(url).await
    }
}

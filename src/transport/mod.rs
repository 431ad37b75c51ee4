//! Transport layer: the shared HTTP session and the headless-browser seam.
//!
//! # Modes
//!
//! | Mode | Type | Timeout | Used for |
//! |------|------|---------|----------|
//! | Static | [`HttpTransport`] | 15 s | feeds and plain HTML pages |
//! | Rendered | [`Renderer::render`] | 45 s | script-heavy pages |
//! | Intercepted | [`Renderer::intercept`] | 45 s | pages backed by an internal JSON API |
//!
//! One [`HttpTransport`] is constructed per run and passed by reference to
//! everything that fetches. Every network error, timeout or non-2xx status
//! is converted to an [`Unavailable`] reason here and never propagated as
//! a failure of the run.

pub mod browser;
#[cfg(feature = "browser")]
pub mod chromium;

pub use browser::{ApiFilter, InterceptedPage, NoopRenderer, Renderer, select_renderer};

use crate::error::Unavailable;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// A realistic desktop browser identity. Government portals routinely
/// refuse obvious bot user agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT_LANGUAGE_VALUE: &str = "fr-CA,fr;q=0.9,en-CA;q=0.8,en;q=0.7";
const ACCEPT_VALUE: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,application/rss+xml;q=0.9,*/*;q=0.8";

/// A successful (2xx) response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Anything that can fetch a URL on behalf of the acquisition layer.
///
/// Implementations must not fail the caller: every problem is an
/// [`Unavailable`] value.
pub trait Transport {
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        params: &[(&str, &str)],
    ) -> Result<RawResponse, Unavailable>;

    async fn get(&self, url: &str, timeout: Duration) -> Result<RawResponse, Unavailable> {
        self.fetch(url, timeout, &[]).await
    }
}

/// The run's single HTTP session: persistent headers, pooled keep-alive
/// connections and a cookie jar.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    #[instrument(level = "debug", skip_all, fields(%url, timeout_secs = timeout.as_secs()))]
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        params: &[(&str, &str)],
    ) -> Result<RawResponse, Unavailable> {
        let mut request = self.client.get(url).timeout(timeout);
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request.send().await.map_err(|e| {
            warn!(%url, error = %e, "request failed");
            Unavailable::network(url, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "non-success status");
            return Err(Unavailable::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| {
            warn!(%url, error = %e, "could not read response body");
            Unavailable::network(url, e)
        })?;
        debug!(%final_url, bytes = body.len(), "fetched");

        Ok(RawResponse {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

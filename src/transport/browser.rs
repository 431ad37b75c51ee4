//! Headless-browser abstraction for script-rendered pages.
//!
//! The [`Renderer`] trait has two implementations: the Chromium-backed one
//! (behind the `browser` feature, and only when a Chromium binary is found
//! at startup) and [`NoopRenderer`], which always reports
//! [`Unavailable::CapabilityMissing`]. Strategies that need a browser treat
//! that reason as "fall back to the static transport".

use crate::error::Unavailable;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

/// Which in-page network responses are worth keeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiFilter {
    /// Lower-case substrings that mark an internal API URL.
    pub url_markers: Vec<String>,
}

impl ApiFilter {
    pub fn new(markers: &[&str]) -> Self {
        Self {
            url_markers: markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    /// A response is kept when its content type is JSON or its URL carries
    /// one of the markers.
    pub fn matches(&self, url: &str, content_type: &str) -> bool {
        if content_type.to_ascii_lowercase().contains("json") {
            return true;
        }
        let url = url.to_lowercase();
        self.url_markers.iter().any(|m| url.contains(m.as_str()))
    }
}

/// What an intercepting render observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterceptedPage {
    /// Final rendered HTML, a secondary source of truth.
    pub html: String,
    /// `(url, parsed body)` for every intercepted JSON response.
    pub payloads: Vec<(String, Value)>,
}

/// A headless browser. Each call owns a fresh browser process for its
/// duration and tears it down on every path.
#[async_trait]
pub trait Renderer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Load `url`, wait for the network to settle, return the rendered HTML.
    async fn render(&self, url: &str, timeout: Duration) -> Result<String, Unavailable>;

    /// Load `url` while recording JSON responses accepted by `filter`.
    async fn intercept(
        &self,
        url: &str,
        timeout: Duration,
        filter: &ApiFilter,
    ) -> Result<InterceptedPage, Unavailable>;
}

/// Stand-in used when no headless browser is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn render(&self, _url: &str, _timeout: Duration) -> Result<String, Unavailable> {
        Err(Unavailable::CapabilityMissing(
            "no headless browser in this build or environment".to_string(),
        ))
    }

    async fn intercept(
        &self,
        _url: &str,
        _timeout: Duration,
        _filter: &ApiFilter,
    ) -> Result<InterceptedPage, Unavailable> {
        Err(Unavailable::CapabilityMissing(
            "no headless browser in this build or environment".to_string(),
        ))
    }
}

/// Pick the renderer once at startup.
pub fn select_renderer(disabled: bool) -> Box<dyn Renderer> {
    if disabled {
        info!("Headless browser disabled; script-rendered sources use static HTTP");
        return Box::new(NoopRenderer);
    }

    #[cfg(feature = "browser")]
    {
        if let Some(path) = super::chromium::find_chromium() {
            info!(path = %path.display(), "Using Chromium for script-rendered sources");
            return Box::new(super::chromium::ChromiumRenderer::new(path));
        }
    }

    info!("No headless browser available; script-rendered sources use static HTTP");
    Box::new(NoopRenderer)
}

//! Chromium-backed renderer using chromiumoxide.

use super::browser::{ApiFilter, InterceptedPage, Renderer};
use crate::error::Unavailable;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, GetResponseBodyParams};
use futures::{FutureExt, StreamExt};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Time allowed after navigation for late XHR/fetch calls to finish.
const NETWORK_SETTLE: Duration = Duration::from_millis(1500);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("ONTARIO_DIGEST_CHROMIUM") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    for candidate in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(candidate) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launches a fresh headless Chromium per call.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    executable: PathBuf,
}

impl ChromiumRenderer {
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>), Unavailable> {
        let config = BrowserConfig::builder()
            .chrome_executable(&self.executable)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .build()
            .map_err(Unavailable::CapabilityMissing)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Unavailable::CapabilityMissing(format!("failed to launch Chromium: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok((browser, handler_task))
    }
}

async fn teardown(mut browser: Browser, handler_task: JoinHandle<()>) {
    if let Err(e) = browser.close().await {
        debug!(error = %e, "browser close failed");
    }
    let _ = browser.wait().await;
    handler_task.abort();
}

fn timed_out(url: &str, timeout: Duration) -> Unavailable {
    Unavailable::network(url, format!("browser timed out after {}s", timeout.as_secs()))
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    fn name(&self) -> &'static str {
        "chromium"
    }

    #[instrument(level = "info", skip_all, fields(%url))]
    async fn render(&self, url: &str, timeout: Duration) -> Result<String, Unavailable> {
        let (browser, handler_task) = self.launch().await?;

        let result = tokio::time::timeout(timeout, async {
            let page = browser
                .new_page(url)
                .await
                .map_err(|e| Unavailable::network(url, e))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| Unavailable::network(url, e))?;
            tokio::time::sleep(NETWORK_SETTLE).await;
            page.content().await.map_err(|e| Unavailable::network(url, e))
        })
        .await
        .unwrap_or_else(|_| Err(timed_out(url, timeout)));

        teardown(browser, handler_task).await;
        if let Ok(html) = &result {
            info!(bytes = html.len(), "rendered page");
        }
        result
    }

    #[instrument(level = "info", skip_all, fields(%url))]
    async fn intercept(
        &self,
        url: &str,
        timeout: Duration,
        filter: &ApiFilter,
    ) -> Result<InterceptedPage, Unavailable> {
        let (browser, handler_task) = self.launch().await?;

        let result = tokio::time::timeout(timeout, async {
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| Unavailable::network(url, e))?;
            let mut responses = page
                .event_listener::<EventResponseReceived>()
                .await
                .map_err(|e| Unavailable::network(url, e))?;

            page.goto(url).await.map_err(|e| Unavailable::network(url, e))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| Unavailable::network(url, e))?;
            tokio::time::sleep(NETWORK_SETTLE).await;

            let mut payloads = Vec::new();
            while let Some(Some(event)) = responses.next().now_or_never() {
                let response_url = event.response.url.clone();
                if !filter.matches(&response_url, &event.response.mime_type) {
                    continue;
                }
                let body = match page
                    .execute(GetResponseBodyParams::new(event.request_id.clone()))
                    .await
                {
                    Ok(body) => body,
                    Err(e) => {
                        debug!(url = %response_url, error = %e, "response body not retrievable");
                        continue;
                    }
                };
                if body.result.base64_encoded {
                    continue;
                }
                match serde_json::from_str(&body.result.body) {
                    Ok(value) => payloads.push((response_url, value)),
                    Err(e) => debug!(url = %response_url, error = %e, "intercepted body is not JSON"),
                }
            }

            let html = page.content().await.map_err(|e| Unavailable::network(url, e))?;
            Ok(InterceptedPage { html, payloads })
        })
        .await
        .unwrap_or_else(|_| Err(timed_out(url, timeout)));

        teardown(browser, handler_task).await;
        match &result {
            Ok(page) => info!(payloads = page.payloads.len(), "intercepted page"),
            Err(e) => warn!(error = %e, "interception failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_renders_inline_page() {
        let path = find_chromium().expect("chromium not installed");
        let renderer = ChromiumRenderer::new(path);
        let html = renderer
            .render("data:text/html,<h1>Hello</h1><p>World</p>", Duration::from_secs(20))
            .await
            .expect("render failed");
        assert!(html.contains("<h1>Hello</h1>"));
    }
}

//! In-memory transport and renderer for tests.

use crate::collector::Collector;
use crate::config::Settings;
use crate::error::Unavailable;
use crate::feed::fixtures::now;
use crate::transport::{ApiFilter, InterceptedPage, NoopRenderer, RawResponse, Renderer, Transport};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Route {
    Body(String),
    Status(u16),
    Panic,
}

/// Serves canned bodies by URL and records every request.
///
/// Query parameters are appended to the URL (`?k=v&k=v`) before lookup.
/// Unknown URLs fail as a connection error.
#[derive(Debug, Default)]
pub struct FakeTransport {
    routes: HashMap<String, Route>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.routes.insert(url.to_string(), Route::Body(body.to_string()));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(url.to_string(), Route::Status(status));
        self
    }

    /// Requests for `url` panic, as a misbehaving parser would.
    pub fn panic_on(mut self, url: &str) -> Self {
        self.routes.insert(url.to_string(), Route::Panic);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    async fn fetch(
        &self,
        url: &str,
        _timeout: Duration,
        params: &[(&str, &str)],
    ) -> Result<RawResponse, Unavailable> {
        let key = if params.is_empty() {
            url.to_string()
        } else {
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("{url}?{}", query.join("&"))
        };
        self.calls.lock().unwrap().push(key.clone());

        match self.routes.get(&key) {
            Some(Route::Body(body)) => Ok(RawResponse {
                url: url.to_string(),
                status: 200,
                body: body.clone(),
            }),
            Some(Route::Status(status)) => Err(Unavailable::Status {
                url: key,
                status: *status,
            }),
            Some(Route::Panic) => panic!("scripted panic for {key}"),
            None => Err(Unavailable::network(&key, "connection refused")),
        }
    }
}

/// A renderer that serves canned rendered HTML and intercepted payloads.
#[derive(Debug, Default, Clone)]
pub struct FakeRenderer {
    pages: HashMap<String, String>,
    intercepts: HashMap<String, InterceptedPage>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn intercept(mut self, url: &str, page: InterceptedPage) -> Self {
        self.intercepts.insert(url.to_string(), page);
        self
    }

    /// Shared handle on the call log, usable after the renderer is boxed.
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn render(&self, url: &str, _timeout: Duration) -> Result<String, Unavailable> {
        self.calls.lock().unwrap().push(format!("render {url}"));
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Unavailable::network(url, "render timed out"))
    }

    async fn intercept(
        &self,
        url: &str,
        _timeout: Duration,
        _filter: &ApiFilter,
    ) -> Result<InterceptedPage, Unavailable> {
        self.calls.lock().unwrap().push(format!("intercept {url}"));
        self.intercepts
            .get(url)
            .cloned()
            .ok_or_else(|| Unavailable::network(url, "render timed out"))
    }
}

/// A collector with no browser, no pauses and the clock pinned to the
/// fixture date.
pub fn collector(transport: FakeTransport) -> Collector<FakeTransport> {
    Collector::new(transport, Box::new(NoopRenderer), Settings::without_delays()).at(now())
}

/// An HTML page with `n` distinct paragraphs, each long enough to survive
/// text extraction.
pub fn long_paragraphs(n: usize) -> String {
    let body: String = (0..n)
        .map(|i| format!("<p>Paragraph {i} of the page describes provincial business in some detail.</p>"))
        .collect();
    format!("<html><body><main>{body}</main></body></html>")
}

//! The Fetch Strategy Chain.
//!
//! A [`Collector`] owns the run's transport, the selected renderer and the
//! settings. [`Collector::fetch_source`] walks a descriptor's strategies in
//! order, each through the uniform [`Collector::attempt`], stopping at the
//! first success:
//!
//! ```text
//! NotStarted ─▶ TryingStrategy(0) ─▶ … ─▶ TryingStrategy(n) ─▶ AllFailed
//!      │               │                        │
//!      ▼               ▼                        ▼
//!    Gated         Succeeded                Succeeded
//! ```
//!
//! Every strategy is attempted at most once per run, and a chain fetches a
//! given URL over static HTTP at most once: later strategies reuse that
//! response, and a rendered strategy with no browser behind it fails with
//! [`Unavailable::CapabilityMissing`] instead. Nothing here returns
//! an error to the caller; failures are [`Unavailable`] reasons collected
//! into [`SourceOutcome::AllFailed`].

use crate::config::Settings;
use crate::error::Unavailable;
use crate::extract::{extract_text, find_links};
use crate::feed::{FeedEntry, FeedWindow, parse_feed, render_recent};
use crate::models::OrderRecord;
use crate::records::{RecordRule, extract_records};
use crate::strategy::{FetchStrategy, PageYield, SourceDescriptor, SourceOutcome};
use crate::transport::{ApiFilter, InterceptedPage, Renderer, Transport};
use crate::utils::{truncate_chars, truncate_for_log};
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How a page is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    Static,
    /// Headless browser, or static HTTP when none is available.
    Rendered,
}

/// An HTML page and the URL it was finally served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub html: String,
}

/// Static responses already obtained in one chain, keyed by request URL.
#[derive(Debug, Default)]
struct Fetched(HashMap<String, Result<Page, Unavailable>>);

impl Fetched {
    fn get(&self, key: &str) -> Option<&Result<Page, Unavailable>> {
        self.0.get(key)
    }

    fn contains(&self, url: &str) -> bool {
        self.0.contains_key(url)
    }

    fn record(&mut self, key: String, result: Result<Page, Unavailable>) {
        self.0.insert(key, result);
    }
}

pub struct Collector<T> {
    transport: T,
    renderer: Box<dyn Renderer>,
    settings: Settings,
    now: DateTime<Utc>,
    today: NaiveDate,
}

impl<T: Transport> Collector<T> {
    pub fn new(transport: T, renderer: Box<dyn Renderer>, settings: Settings) -> Self {
        Self {
            transport,
            renderer,
            settings,
            now: Utc::now(),
            today: Local::now().date_naive(),
        }
    }

    /// Pin the clock used for recency windows and temporal gates.
    #[cfg(test)]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self.today = now.date_naive();
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Pause between dependent calls to the same site.
    pub async fn pause(&self) {
        sleep_unless_zero(self.settings.politeness_delay()).await;
    }

    /// Pause between jurisdictions in the interprovincial watcher.
    pub async fn pause_between_jurisdictions(&self) {
        sleep_unless_zero(self.settings.jurisdiction_delay()).await;
    }

    /// Run a descriptor's chain to a terminal state.
    ///
    /// # Arguments
    ///
    /// * `source` - The descriptor: ordered strategies, optional gate,
    ///   character cap and placeholder
    ///
    /// # Returns
    ///
    /// [`SourceOutcome::Gated`] without any network call when the gate is
    /// closed, the first success truncated to the source cap, or every
    /// strategy's failure reason alongside the placeholder.
    #[instrument(level = "info", skip_all, fields(source = %source.name))]
    pub async fn fetch_source(&self, source: &SourceDescriptor) -> SourceOutcome {
        if let Some(gate) = &source.gate {
            if gate.is_closed(self.today) {
                info!(not_before = %gate.not_before, "temporal gate closed; source not queried");
                return SourceOutcome::Gated(truncate_chars(&gate.placeholder, source.max_chars));
            }
        }

        let mut reasons = Vec::with_capacity(source.strategies.len());
        let mut fetched = Fetched::default();
        for (index, strategy) in source.strategies.iter().enumerate() {
            if index > 0 {
                self.pause().await;
            }
            match self.attempt_in_chain(strategy, source.max_chars, &mut fetched).await {
                Ok(text) => {
                    let text = truncate_chars(&text, source.max_chars);
                    info!(
                        strategy = strategy.label(),
                        url = %strategy.url(),
                        chars = text.chars().count(),
                        "strategy succeeded"
                    );
                    return SourceOutcome::Succeeded {
                        strategy: index,
                        text,
                    };
                }
                Err(reason) => {
                    warn!(
                        strategy = strategy.label(),
                        url = %strategy.url(),
                        kind = ?reason.kind(),
                        reason = %reason,
                        "strategy failed"
                    );
                    reasons.push(reason);
                }
            }
        }

        warn!(attempts = reasons.len(), "all strategies failed; using placeholder");
        SourceOutcome::AllFailed {
            reasons,
            placeholder: truncate_chars(&source.placeholder, source.max_chars),
        }
    }

    /// Evaluate one strategy on its own, outside any chain.
    #[cfg(test)]
    pub async fn attempt(&self, strategy: &FetchStrategy, max_chars: usize) -> Result<String, Unavailable> {
        self.attempt_in_chain(strategy, max_chars, &mut Fetched::default())
            .await
    }

    /// Evaluate one strategy. The success predicate of each variant is
    /// applied here; a failed predicate is an [`Unavailable::Empty`].
    async fn attempt_in_chain(
        &self,
        strategy: &FetchStrategy,
        max_chars: usize,
        fetched: &mut Fetched,
    ) -> Result<String, Unavailable> {
        match strategy {
            FetchStrategy::Feed {
                url,
                window,
                min_entries,
            } => self.attempt_feed(url, window, *min_entries).await,
            FetchStrategy::StaticPage {
                url,
                params,
                yields,
                min_chars,
            } => {
                let params: Vec<(&str, &str)> =
                    params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                let page = self.static_page(url, &params, fetched).await?;
                self.apply_yield(&page, yields, max_chars, *min_chars).await
            }
            FetchStrategy::RenderedPage {
                url,
                yields,
                min_chars,
            } => {
                let page = self.rendered_page(url, fetched).await?;
                self.apply_yield(&page, yields, max_chars, *min_chars).await
            }
            FetchStrategy::InterceptedApi { url, filter, rule } => {
                self.attempt_records(url, filter, rule, fetched).await
            }
        }
    }

    /// Fetch a page, degrading a rendered request to static HTTP when the
    /// browser capability is missing.
    pub async fn page(&self, url: &str, mode: PageMode) -> Result<Page, Unavailable> {
        let mut fetched = Fetched::default();
        match mode {
            PageMode::Static => self.static_page(url, &[], &mut fetched).await,
            PageMode::Rendered => self.rendered_page(url, &mut fetched).await,
        }
    }

    async fn static_page(
        &self,
        url: &str,
        params: &[(&str, &str)],
        fetched: &mut Fetched,
    ) -> Result<Page, Unavailable> {
        let key = request_key(url, params);
        if let Some(earlier) = fetched.get(&key) {
            debug!(%key, "reusing static response from earlier in the chain");
            return earlier.clone();
        }
        let result = self
            .transport
            .fetch(url, self.settings.static_timeout(), params)
            .await
            .map(|response| Page {
                url: response.url,
                html: response.body,
            });
        fetched.record(key, result.clone());
        result
    }

    async fn rendered_page(&self, url: &str, fetched: &mut Fetched) -> Result<Page, Unavailable> {
        match self.renderer.render(url, self.settings.rendered_timeout()).await {
            Ok(html) => Ok(Page {
                url: url.to_string(),
                html,
            }),
            Err(Unavailable::CapabilityMissing(why)) if fetched.contains(url) => Err(
                Unavailable::CapabilityMissing(format!("{why}; {url} already fetched statically")),
            ),
            Err(Unavailable::CapabilityMissing(why)) => {
                debug!(%url, %why, "no browser; falling back to static transport");
                self.static_page(url, &[], fetched).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn feed_entries(&self, url: &str) -> Result<Vec<FeedEntry>, Unavailable> {
        let response = self.transport.get(url, self.settings.static_timeout()).await?;
        parse_feed(&response.body).inspect_err(|e| {
            debug!(
                %url,
                error = %e,
                body_preview = %truncate_for_log(&response.body, 200),
                "response is not a feed"
            )
        })
    }

    async fn attempt_feed(
        &self,
        url: &str,
        window: &FeedWindow,
        min_entries: usize,
    ) -> Result<String, Unavailable> {
        let entries = self.feed_entries(url).await?;
        if entries.len() < min_entries {
            return Err(Unavailable::empty(format!(
                "feed has {} entries, needs {min_entries}",
                entries.len()
            )));
        }
        let items = render_recent(&entries, self.now, window);
        if items.is_empty() {
            return Err(Unavailable::empty("no feed entries to report"));
        }
        Ok(items.join("\n\n"))
    }

    async fn apply_yield(
        &self,
        page: &Page,
        yields: &PageYield,
        max_chars: usize,
        min_chars: usize,
    ) -> Result<String, Unavailable> {
        match yields {
            PageYield::Text { main_only } => {
                let text = extract_text(&page.html, max_chars, *main_only);
                require_length(text, min_chars)
            }
            PageYield::Links {
                markers,
                min_title_chars,
                limit,
            } => {
                let markers: Vec<&str> = markers.iter().map(String::as_str).collect();
                let links = find_links(&page.html, &page.url, &markers, *min_title_chars);
                if links.is_empty() {
                    return Err(Unavailable::empty("no qualifying links"));
                }
                Ok(links
                    .iter()
                    .take(*limit)
                    .map(|l| format!("{}\n{}", l.title, l.url))
                    .collect::<Vec<_>>()
                    .join("\n\n"))
            }
            PageYield::FollowLink { markers, label } => {
                self.follow_link(page, markers, label, max_chars, min_chars).await
            }
        }
    }

    async fn follow_link(
        &self,
        index: &Page,
        markers: &[String],
        label: &str,
        max_chars: usize,
        min_chars: usize,
    ) -> Result<String, Unavailable> {
        let markers: Vec<&str> = markers.iter().map(String::as_str).collect();
        let Some(link) = find_links(&index.html, &index.url, &markers, 1).into_iter().next() else {
            let text = require_length(extract_text(&index.html, max_chars, false), min_chars)?;
            return Ok(format!(
                "Index récupéré (pas de {label} identifié ce jour):\n{text}"
            ));
        };

        self.pause().await;
        match self.transport.get(&link.url, self.settings.static_timeout()).await {
            Ok(response) => {
                let text = extract_text(&response.body, max_chars, false);
                Ok(format!("{label} : {}\nLien : {}\n\n{text}", link.title, link.url))
            }
            Err(e) => {
                warn!(url = %link.url, error = %e, "linked document not reachable");
                Ok(format!(
                    "{label} le plus récent trouvé : {}\nLien : {}\n(Contenu non accessible)",
                    link.title, link.url
                ))
            }
        }
    }

    async fn attempt_records(
        &self,
        url: &str,
        filter: &ApiFilter,
        rule: &RecordRule,
        fetched: &mut Fetched,
    ) -> Result<String, Unavailable> {
        let page = match self
            .renderer
            .intercept(url, self.settings.intercept_timeout(), filter)
            .await
        {
            Ok(page) => page,
            Err(Unavailable::CapabilityMissing(why)) => {
                debug!(%url, %why, "no browser; reading static HTML for records");
                let page = self.static_page(url, &[], fetched).await?;
                InterceptedPage {
                    html: page.html,
                    payloads: Vec::new(),
                }
            }
            Err(e) => return Err(e),
        };

        let records = extract_records(&page, url, rule);
        if records.is_empty() {
            return Err(Unavailable::empty("no individual records found"));
        }
        info!(count = records.len(), "extracted records");

        let records = self.enrich_records(records).await;
        Ok(records
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    /// Fetch each record's own page for a bounded main-content excerpt.
    /// A failed detail fetch keeps the record with what it already had.
    async fn enrich_records(&self, mut records: Vec<OrderRecord>) -> Vec<OrderRecord> {
        let budget = self.settings.caps.record_excerpt;
        for record in records.iter_mut().filter(|r| !r.link.is_empty()) {
            self.pause().await;
            match self.transport.get(&record.link, self.settings.static_timeout()).await {
                Ok(response) => {
                    let excerpt = extract_text(&response.body, budget, true);
                    if !excerpt.is_empty() {
                        record.summary = excerpt;
                    }
                }
                Err(e) => {
                    warn!(url = %record.link, error = %e, "record detail not reachable");
                    if record.summary.is_empty() {
                        record.summary = "(détail non accessible)".to_string();
                    }
                }
            }
        }
        records
    }
}

/// `url` with its query string, as the transport would send it.
fn request_key(url: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{url}?{}", query.join("&"))
}

fn require_length(text: String, min_chars: usize) -> Result<String, Unavailable> {
    let n = text.chars().count();
    if n <= min_chars {
        return Err(Unavailable::empty(format!(
            "{n} characters of text, needs more than {min_chars}"
        )));
    }
    Ok(text)
}

async fn sleep_unless_zero(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

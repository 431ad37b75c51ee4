//! Source Descriptors and the Fetch Strategy variants.
//!
//! A source is declared as data: a name, an ordered list of
//! [`FetchStrategy`] values (cheapest first: feed → static HTML → rendered
//! HTML → intercepted API), an optional [`TemporalGate`], a hard character
//! cap and the sentence to use when every strategy fails. The chain that
//! evaluates a descriptor lives in [`crate::collector`].

use crate::error::Unavailable;
use crate::feed::FeedWindow;
use crate::records::RecordRule;
use crate::transport::ApiFilter;
use chrono::NaiveDate;

/// Extracted text must be longer than this for a page strategy to succeed.
pub const DEFAULT_MIN_CHARS: usize = 200;

/// What a page strategy makes of the HTML it fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageYield {
    /// Bounded visible text, optionally narrowed to the main region.
    Text { main_only: bool },
    /// `title\nURL` pairs for anchors whose URL carries a marker.
    Links {
        markers: Vec<String>,
        min_title_chars: usize,
        limit: usize,
    },
    /// Follow the first anchor whose URL carries a marker and return that
    /// page's text under a `label` heading.
    FollowLink { markers: Vec<String>, label: String },
}

impl PageYield {
    pub fn text() -> Self {
        Self::Text { main_only: false }
    }

    pub fn links(markers: &[&str], limit: usize) -> Self {
        Self::Links {
            markers: markers.iter().map(|m| m.to_string()).collect(),
            min_title_chars: 15,
            limit,
        }
    }

    pub fn follow(markers: &[&str], label: &str) -> Self {
        Self::FollowLink {
            markers: markers.iter().map(|m| m.to_string()).collect(),
            label: label.to_string(),
        }
    }
}

/// One way of acquiring content from a source.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchStrategy {
    /// Syndication feed; succeeds with at least `min_entries` entries.
    Feed {
        url: String,
        window: FeedWindow,
        min_entries: usize,
    },
    /// Plain HTTP GET.
    StaticPage {
        url: String,
        params: Vec<(String, String)>,
        yields: PageYield,
        min_chars: usize,
    },
    /// Headless-browser render; degrades to a static GET of the same URL
    /// when no browser is available.
    RenderedPage {
        url: String,
        yields: PageYield,
        min_chars: usize,
    },
    /// Headless-browser render that records in-page JSON responses and
    /// turns them into discrete records.
    InterceptedApi {
        url: String,
        filter: ApiFilter,
        rule: RecordRule,
    },
}

impl FetchStrategy {
    pub fn feed(url: &str, window: FeedWindow) -> Self {
        Self::Feed {
            url: url.to_string(),
            window,
            min_entries: 1,
        }
    }

    pub fn static_page(url: &str, yields: PageYield) -> Self {
        Self::StaticPage {
            url: url.to_string(),
            params: Vec::new(),
            yields,
            min_chars: DEFAULT_MIN_CHARS,
        }
    }

    pub fn static_text(url: &str) -> Self {
        Self::static_page(url, PageYield::text())
    }

    pub fn rendered_page(url: &str, yields: PageYield) -> Self {
        Self::RenderedPage {
            url: url.to_string(),
            yields,
            min_chars: DEFAULT_MIN_CHARS,
        }
    }

    pub fn rendered_text(url: &str) -> Self {
        Self::rendered_page(url, PageYield::text())
    }

    pub fn intercepted(url: &str, filter: ApiFilter, rule: RecordRule) -> Self {
        Self::InterceptedApi {
            url: url.to_string(),
            filter,
            rule,
        }
    }

    /// Attach query parameters to a static page strategy.
    pub fn with_params(mut self, pairs: &[(&str, &str)]) -> Self {
        if let Self::StaticPage { params, .. } = &mut self {
            *params = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
        }
        self
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Feed { .. } => "feed",
            Self::StaticPage { .. } => "static",
            Self::RenderedPage { .. } => "rendered",
            Self::InterceptedApi { .. } => "intercepted",
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Feed { url, .. }
            | Self::StaticPage { url, .. }
            | Self::RenderedPage { url, .. }
            | Self::InterceptedApi { url, .. } => url,
        }
    }
}

/// Suppresses a source entirely before a given date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalGate {
    pub not_before: NaiveDate,
    pub placeholder: String,
}

impl TemporalGate {
    pub fn is_closed(&self, today: NaiveDate) -> bool {
        today < self.not_before
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    pub name: String,
    pub strategies: Vec<FetchStrategy>,
    pub gate: Option<TemporalGate>,
    /// Hard cap on the characters this source may contribute.
    pub max_chars: usize,
    /// Used when every strategy fails; never empty.
    pub placeholder: String,
}

impl SourceDescriptor {
    pub fn new(name: &str, max_chars: usize, placeholder: &str) -> Self {
        Self {
            name: name.to_string(),
            strategies: Vec::new(),
            gate: None,
            max_chars,
            placeholder: placeholder.to_string(),
        }
    }

    pub fn then(mut self, strategy: FetchStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn gated(mut self, not_before: NaiveDate, placeholder: String) -> Self {
        self.gate = Some(TemporalGate {
            not_before,
            placeholder,
        });
        self
    }
}

/// Terminal state of one source's chain.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    /// Strategy `strategy` (index into the descriptor) produced `text`.
    Succeeded { strategy: usize, text: String },
    /// The temporal gate was closed; no network call was made.
    Gated(String),
    /// Every strategy failed; `reasons` holds one entry per attempt.
    AllFailed {
        reasons: Vec<Unavailable>,
        placeholder: String,
    },
}

impl SourceOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Succeeded { text, .. } | Self::Gated(text) => text,
            Self::AllFailed { placeholder, .. } => placeholder,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Succeeded { text, .. } | Self::Gated(text) => text,
            Self::AllFailed { placeholder, .. } => placeholder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_and_labels() {
        let s = FetchStrategy::static_text("https://www.ontario.ca/page/ontario-gazette")
            .with_params(&[("language", "en")]);
        assert_eq!(s.label(), "static");
        assert_eq!(s.url(), "https://www.ontario.ca/page/ontario-gazette");
        match s {
            FetchStrategy::StaticPage {
                params, min_chars, ..
            } => {
                assert_eq!(params, vec![("language".to_string(), "en".to_string())]);
                assert_eq!(min_chars, DEFAULT_MIN_CHARS);
            }
            other => panic!("unexpected strategy {other:?}"),
        }

        let feed = FetchStrategy::feed("https://news.ontario.ca/en/rss", FeedWindow::hours(36))
            .with_params(&[("ignored", "yes")]);
        assert_eq!(feed.label(), "feed");
    }

    #[test]
    fn test_gate_is_closed_before_date() {
        let gate = TemporalGate {
            not_before: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            placeholder: "relâche".to_string(),
        };
        assert!(gate.is_closed(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()));
        assert!(!gate.is_closed(NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()));
    }

    #[test]
    fn test_outcome_text_is_never_empty_for_failures() {
        let outcome = SourceOutcome::AllFailed {
            reasons: vec![Unavailable::empty("no entries")],
            placeholder: "Gazette de l'Ontario non disponible.".to_string(),
        };
        assert_eq!(outcome.text(), "Gazette de l'Ontario non disponible.");
        assert_eq!(outcome.into_text(), "Gazette de l'Ontario non disponible.");
    }
}

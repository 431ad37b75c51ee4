//! Content Extractor: HTML → bounded plain text.
//!
//! # Pipeline
//!
//! 1. Optionally narrow to the main-content region ([`main_region`])
//! 2. Collect visible text nodes, skipping anything inside
//!    [`STRIPPED_TAGS`] (scripts, styles, navigation chrome)
//! 3. Keep trimmed lines longer than [`MIN_LINE_CHARS`]; shorter lines are
//!    almost always layout artifacts (menu items, breadcrumbs, buttons)
//! 4. Keep at most [`MAX_LINES`] lines, then cut to the caller's budget
//!
//! Link discovery for index pages ([`find_links`]) lives here too, since it
//! walks the same parsed documents.

use crate::utils::{collapse_whitespace, truncate_chars};
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Elements whose text is never content.
pub const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside",
];

/// Lines of this many characters or fewer are dropped.
pub const MIN_LINE_CHARS: usize = 25;

/// At most this many lines survive before the character cap.
pub const MAX_LINES: usize = 200;

/// Candidate main-content regions, most specific first.
const MAIN_SELECTORS: &[&str] = &[
    "main",
    "[role=\"main\"]",
    "#main-content",
    "#content",
    ".main-content",
    "article",
    ".content",
];

/// Extract bounded plain text from an HTML document.
///
/// # Arguments
///
/// * `html` - A full HTML document, possibly malformed
/// * `max_chars` - Upper bound on the returned text, in characters
/// * `main_only` - Narrow to the best-guess main region when one exists;
///   otherwise the whole document is used
///
/// # Returns
///
/// Newline-separated content lines, never longer than `max_chars`
/// characters. Empty when nothing survives the line filter.
pub fn extract_text(html: &str, max_chars: usize, main_only: bool) -> String {
    let document = Html::parse_document(html);
    let root = if main_only {
        main_region(&document).unwrap_or_else(|| document.root_element())
    } else {
        document.root_element()
    };
    bound_lines(&visible_text(root), max_chars)
}

/// Apply the line-length filter, the line cap and the character cap.
pub fn bound_lines(raw: &str, max_chars: usize) -> String {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| l.chars().count() > MIN_LINE_CHARS)
        .take(MAX_LINES)
        .collect();
    truncate_chars(&lines.join("\n"), max_chars)
}

/// First main-content candidate that actually holds visible text.
pub fn main_region(document: &Html) -> Option<ElementRef<'_>> {
    MAIN_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .find(|el| !visible_text(*el).trim().is_empty())
        })
}

/// Every visible text node under `root`, one per line.
pub fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        if node.parent().and_then(ElementRef::wrap).is_some_and(|p| is_stripped(&p)) {
            continue;
        }
        out.push_str(text);
        out.push('\n');
    }
    out
}

/// `true` when `el` sits inside navigation chrome or script-like elements.
pub fn in_stripped_region(el: &ElementRef<'_>) -> bool {
    el.ancestors().any(|a| {
        a.value()
            .as_element()
            .is_some_and(|e| STRIPPED_TAGS.contains(&e.name()))
    })
}

/// `true` when `el` is itself a stripped element or lies inside one.
fn is_stripped(el: &ElementRef<'_>) -> bool {
    STRIPPED_TAGS.contains(&el.value().name()) || in_stripped_region(el)
}

/// Plain text of an HTML fragment (feed summaries, anchor bodies), on one line.
pub fn fragment_text(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let text = parsed.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// An anchor discovered on an index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub title: String,
    pub url: String,
}

/// Anchors whose resolved URL contains any of `markers` (case-insensitive)
/// and whose text is at least `min_title_chars` long, in document order,
/// without repeated URLs.
///
/// Links back to the page itself (`#main-content`, `?page=2`) never count,
/// even when the page URL carries a marker.
///
/// # Arguments
///
/// * `html` - The index page
/// * `base` - URL the page was fetched from, used to resolve relative hrefs
/// * `markers` - Substrings, any of which qualifies a link
/// * `min_title_chars` - Shortest acceptable anchor text
///
/// # Returns
///
/// Absolute http(s) links, fragments removed.
pub fn find_links(html: &str, base: &str, markers: &[&str], min_title_chars: usize) -> Vec<Link> {
    let Ok(base) = Url::parse(base) else {
        return Vec::new();
    };
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();
    for el in document.select(&anchor) {
        let Some(href) = el.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        resolved.set_fragment(None);
        if same_page(&resolved, &base) {
            continue;
        }
        let url = resolved.to_string();
        let lowered = url.to_lowercase();
        if !markers.iter().any(|m| lowered.contains(&m.to_lowercase())) {
            continue;
        }
        let title = collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "));
        if title.is_empty() || title.chars().count() < min_title_chars {
            continue;
        }
        if seen.insert(url.clone()) {
            links.push(Link { title, url });
        }
    }
    links
}

/// Same host and path, ignoring query, fragment and a trailing slash.
fn same_page(link: &Url, page: &Url) -> bool {
    link.host_str() == page.host_str()
        && link.path().trim_end_matches('/') == page.path().trim_end_matches('/')
}

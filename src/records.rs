//! Structured record extraction for the orders-in-council source.
//!
//! Two extraction paths, tried in order:
//!
//! 1. **Intercepted JSON**: walk every payload recursively (to
//!    [`MAX_JSON_DEPTH`]) and treat any object with a title-like field plus
//!    a date-like or number-like field as a record. Keys are matched
//!    case-insensitively against a small alias table.
//! 2. **Rendered HTML**: anchors whose URL looks like an individual record
//!    page (contains the record marker segment, is deep enough, and has no
//!    `search` segment).
//!
//! Candidates are deduplicated on `(title, date)`, first seen wins.

use crate::extract::in_stripped_region;
use crate::models::OrderRecord;
use crate::transport::InterceptedPage;
use crate::utils::collapse_whitespace;
use itertools::Itertools;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use url::Url;

pub const MAX_JSON_DEPTH: usize = 6;

const TITLE_KEYS: &[&str] = &["title", "name", "label"];
const DATE_KEYS: &[&str] = &[
    "date",
    "approved_date",
    "approval_date",
    "filed_date",
    "effective_date",
    "published_date",
];
const NUMBER_KEYS: &[&str] = &["number", "oic_number", "order_number", "oc_number", "reference"];
const LINK_KEYS: &[&str] = &["url", "link", "href", "path"];
const SUMMARY_KEYS: &[&str] = &["summary", "description", "excerpt", "body"];

/// What an individual record page looks like, and how many to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRule {
    /// Path segment every record URL carries, e.g. `orders-in-council`.
    pub path_marker: String,
    /// Minimum number of path segments; index pages are shallower.
    pub min_depth: usize,
    /// Records kept after deduplication.
    pub limit: usize,
}

/// Extract, deduplicate and cap the records of an intercepted page.
pub fn extract_records(page: &InterceptedPage, base: &str, rule: &RecordRule) -> Vec<OrderRecord> {
    let Ok(base) = Url::parse(base) else {
        return Vec::new();
    };

    let mut candidates: Vec<OrderRecord> = page
        .payloads
        .iter()
        .flat_map(|(_, payload)| records_from_json(payload, &base))
        .collect();
    if candidates.is_empty() {
        candidates = records_from_html(&page.html, &base, rule);
    }

    dedupe(candidates).into_iter().take(rule.limit).collect()
}

/// Drop every record whose `(title, date)` was already seen.
pub fn dedupe(records: Vec<OrderRecord>) -> Vec<OrderRecord> {
    records
        .into_iter()
        .unique_by(|r| r.dedup_key())
        .collect()
}

pub fn records_from_json(payload: &Value, base: &Url) -> Vec<OrderRecord> {
    let mut out = Vec::new();
    walk(payload, 0, base, &mut out);
    out
}

fn walk(value: &Value, depth: usize, base: &Url, out: &mut Vec<OrderRecord>) {
    if depth > MAX_JSON_DEPTH {
        return;
    }
    match value {
        Value::Object(map) => {
            if let Some(record) = candidate(map, base) {
                out.push(record);
                return;
            }
            for child in map.values() {
                walk(child, depth + 1, base, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                walk(child, depth + 1, base, out);
            }
        }
        _ => {}
    }
}

fn candidate(map: &Map<String, Value>, base: &Url) -> Option<OrderRecord> {
    let title = field(map, TITLE_KEYS)?;
    let date = field(map, DATE_KEYS);
    let number = field(map, NUMBER_KEYS);
    if date.is_none() && number.is_none() {
        return None;
    }
    let link = field(map, LINK_KEYS)
        .and_then(|l| base.join(&l).ok())
        .map(|u| u.to_string())
        .unwrap_or_default();

    Some(OrderRecord {
        title: collapse_whitespace(&title),
        date: date.unwrap_or_default(),
        number: number.unwrap_or_default(),
        link,
        summary: field(map, SUMMARY_KEYS)
            .map(|s| collapse_whitespace(&s))
            .unwrap_or_default(),
    })
}

/// First non-empty scalar among `aliases`, matched case-insensitively.
fn field(map: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| {
        map.iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(alias))
            .find_map(|(_, v)| scalar(v))
    })
}

fn scalar(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

pub fn records_from_html(html: &str, base: &Url, rule: &RecordRule) -> Vec<OrderRecord> {
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    document
        .select(&anchor)
        .filter(|el| !in_stripped_region(el))
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let url = base.join(href.trim()).ok()?;
            if !is_record_url(&url, rule) {
                return None;
            }
            let title = collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "));
            if title.is_empty() {
                return None;
            }
            Some(OrderRecord {
                title,
                link: url.to_string(),
                ..Default::default()
            })
        })
        .collect()
}

/// Individual record pages carry the marker segment, sit at least
/// `min_depth` segments deep, and are never search pages.
pub fn is_record_url(url: &Url, rule: &RecordRule) -> bool {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    segments.len() >= rule.min_depth
        && segments.iter().any(|s| s.eq_ignore_ascii_case(&rule.path_marker))
        && !segments.iter().any(|s| s.eq_ignore_ascii_case("search"))
}

//! Syndication feed parsing (RSS 2.0 and Atom) and the recency window.
//!
//! Feeds are deserialized with `quick-xml`'s serde support. The root element
//! decides the dialect; anything else is a parse failure.

use crate::error::Unavailable;
use crate::extract::fragment_text;
use crate::utils::truncate_chars;
use chrono::{DateTime, Duration, Utc};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<String>,
    content: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// One feed entry, normalized across dialects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// Plain text; any HTML in the feed summary is flattened.
    pub summary: String,
    pub published: Option<DateTime<Utc>>,
}

/// How many entries to look at and keep when rendering a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedWindow {
    /// Entries published this recently are always kept.
    pub recency: Duration,
    /// Only the first `scan` entries are considered.
    pub scan: usize,
    /// Older entries are still kept until this many have been collected.
    pub keep_min: usize,
    pub max_items: usize,
    pub summary_chars: usize,
}

impl FeedWindow {
    pub fn hours(hours: i64) -> Self {
        Self {
            recency: Duration::hours(hours),
            scan: 20,
            keep_min: 3,
            max_items: 8,
            summary_chars: 500,
        }
    }
}

/// Parse an RSS 2.0 or Atom document.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, Unavailable> {
    let xml = scrub_html_entities_for_xml(xml);
    match root_name(&xml).as_deref() {
        Some("rss") => {
            let rss: Rss = from_str(&xml).map_err(|e| Unavailable::parse("rss feed", e))?;
            Ok(rss.channel.items.into_iter().map(FeedEntry::from).collect())
        }
        Some("feed") => {
            let feed: AtomFeed = from_str(&xml).map_err(|e| Unavailable::parse("atom feed", e))?;
            Ok(feed.entries.into_iter().map(FeedEntry::from).collect())
        }
        Some(other) => Err(Unavailable::parse(
            "feed",
            format!("unexpected root element <{other}>"),
        )),
        None => Err(Unavailable::parse("feed", "no root element")),
    }
}

/// Render the entries worth passing on, newest-first as the feed lists them.
///
/// An entry is kept when it falls inside the recency window or when fewer
/// than `keep_min` entries have been kept so far. Entries without a
/// parseable date count as published `now`.
pub fn render_recent(entries: &[FeedEntry], now: DateTime<Utc>, window: &FeedWindow) -> Vec<String> {
    let cutoff = now - window.recency;
    let mut items = Vec::new();
    for entry in entries.iter().take(window.scan) {
        let published = entry.published.unwrap_or(now);
        if published < cutoff && items.len() >= window.keep_min {
            continue;
        }
        let title = if entry.title.is_empty() {
            "(sans titre)"
        } else {
            entry.title.as_str()
        };
        items.push(format!(
            "[{}] {}\n{}\n{}",
            published.format("%Y-%m-%d"),
            title,
            truncate_chars(&entry.summary, window.summary_chars),
            entry.link
        ));
    }
    items.truncate(window.max_items);
    items
}

fn root_name(xml: &str) -> Option<String> {
    let mut reader = quick_xml::Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn clean(field: Option<String>) -> String {
    field.map(|s| fragment_text(&s)).unwrap_or_default()
}

impl From<RssItem> for FeedEntry {
    fn from(item: RssItem) -> Self {
        Self {
            title: clean(item.title),
            link: item.link.map(|l| l.trim().to_string()).unwrap_or_default(),
            summary: clean(item.description),
            published: item.pub_date.as_deref().and_then(parse_date),
        }
    }
}

impl From<AtomEntry> for FeedEntry {
    fn from(entry: AtomEntry) -> Self {
        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref().is_none_or(|r| r == "alternate"))
            .or_else(|| entry.links.first())
            .and_then(|l| l.href.clone())
            .unwrap_or_default();
        Self {
            title: clean(entry.title),
            link,
            summary: clean(entry.summary.or(entry.content)),
            published: entry
                .published
                .or(entry.updated)
                .as_deref()
                .and_then(parse_date),
        }
    }
}

/// HTML entities that are not defined in XML show up in government feeds.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&eacute;", "é")
        .replace("&egrave;", "è")
        .replace("&agrave;", "à")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Utc};

    /// An RSS document with one `<item>` per `(title, pubDate)` pair.
    pub fn rss(items: &[(&str, &str)]) -> String {
        let body: String = items
            .iter()
            .enumerate()
            .map(|(i, (title, date))| {
                format!(
                    "<item><title>{title}</title><link>https://news.ontario.ca/en/release/{i}</link>\
                     <description><![CDATA[<p>Summary of {title}</p>]]></description>\
                     <pubDate>{date}</pubDate></item>"
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rss version=\"2.0\"><channel>\
             <title>Ontario Newsroom</title><link>https://news.ontario.ca</link>{body}</channel></rss>"
        )
    }

    pub fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-18T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{now, rss};
    use super::*;

    #[test]
    fn test_parse_rss_items() {
        let xml = rss(&[
            ("Ontario Building More Homes", "Sat, 17 Oct 2026 14:00:00 -0400"),
            ("Province Expands Transit &amp; Roads", "Fri, 16 Oct 2026 09:30:00 EDT"),
        ]);
        let entries = parse_feed(&xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Ontario Building More Homes");
        assert_eq!(entries[0].summary, "Summary of Ontario Building More Homes");
        assert_eq!(entries[0].link, "https://news.ontario.ca/en/release/0");
        assert_eq!(entries[1].title, "Province Expands Transit & Roads");
        assert_eq!(
            entries[0].published.unwrap().to_rfc3339(),
            "2026-10-17T18:00:00+00:00"
        );
    }

    #[test]
    fn test_parse_empty_channel() {
        let entries = parse_feed(&rss(&[])).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_parse_atom_entries() {
        let xml = r#"<?xml version="1.0"?>
            <feed xmlns="http://www.w3.org/2005/Atom">
              <title>Journal des débats</title>
              <entry>
                <title>Séance du 15 octobre 2026</title>
                <link rel="alternate" href="https://www.assnat.qc.ca/fr/seance-15"/>
                <summary>Débats sur l&apos;entente avec l&apos;Ontario</summary>
                <updated>2026-10-15T20:00:00Z</updated>
              </entry>
            </feed>"#;
        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link, "https://www.assnat.qc.ca/fr/seance-15");
        assert_eq!(entries[0].summary, "Débats sur l'entente avec l'Ontario");
        assert!(entries[0].published.is_some());
    }

    #[test]
    fn test_html_document_is_parse_failure() {
        let err = parse_feed("<html><body>Maintenance</body></html>").unwrap_err();
        assert!(matches!(err, Unavailable::Parse { .. }));
        assert!(parse_feed("").is_err());
    }

    #[test]
    fn test_html_entities_do_not_break_parsing() {
        let xml = rss(&[("Premier&nbsp;Ford &mdash; statement", "Sat, 17 Oct 2026 14:00:00 -0400")]);
        let entries = parse_feed(&xml).unwrap();
        assert_eq!(entries[0].title, "Premier Ford - statement");
    }

    #[test]
    fn test_recent_entries_are_dated_lines() {
        let xml = rss(&[
            ("First Release", "Sun, 18 Oct 2026 08:00:00 -0400"),
            ("Second Release", "Sat, 17 Oct 2026 08:00:00 -0400"),
            ("Third Release", "Sat, 17 Oct 2026 07:00:00 -0400"),
        ]);
        let entries = parse_feed(&xml).unwrap();
        let items = render_recent(&entries, now(), &FeedWindow::hours(36));
        assert_eq!(items.len(), 3);
        assert!(items[0].starts_with("[2026-10-18] First Release\n"));
        assert!(items[1].starts_with("[2026-10-17] Second Release\n"));
        assert!(items[2].ends_with("https://news.ontario.ca/en/release/2"));
    }

    #[test]
    fn test_old_entries_fill_up_to_keep_min() {
        let xml = rss(&[
            ("Old One", "Mon, 01 Jun 2026 10:00:00 -0400"),
            ("Old Two", "Mon, 01 Jun 2026 09:00:00 -0400"),
            ("Old Three", "Mon, 01 Jun 2026 08:00:00 -0400"),
            ("Old Four", "Mon, 01 Jun 2026 07:00:00 -0400"),
        ]);
        let entries = parse_feed(&xml).unwrap();
        let items = render_recent(&entries, now(), &FeedWindow::hours(36));
        assert_eq!(items.len(), 3);
        assert!(!items.iter().any(|i| i.contains("Old Four")));
    }

    #[test]
    fn test_undated_entry_counts_as_now_and_max_items_applies() {
        let entries: Vec<FeedEntry> = (0..12)
            .map(|i| FeedEntry {
                title: format!("Release {i}"),
                link: String::new(),
                summary: "é".repeat(900),
                published: None,
            })
            .collect();
        let items = render_recent(&entries, now(), &FeedWindow::hours(36));
        assert_eq!(items.len(), 8);
        assert!(items[0].starts_with("[2026-10-18] Release 0\n"));
        assert_eq!(items[0].lines().nth(1).unwrap().chars().count(), 500);
    }
}

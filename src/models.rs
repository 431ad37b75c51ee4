//! Data models handed between acquisition stages and to the summarizer.
//!
//! - [`SourceEntry`] / [`SourceBundle`]: the ordered `{name → text}` mapping
//!   that is the sole contract with the summarization collaborator
//! - [`OrderRecord`]: one discrete government order extracted from the
//!   orders-in-council search
//! - [`RelevanceMatch`]: an excerpt from another province's source that
//!   mentions Ontario

use serde::{Deserialize, Serialize};
use std::fmt;

/// One named, bounded block of acquired text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceEntry {
    pub name: String,
    pub text: String,
}

/// The ordered result of a run: every Ontario source, then the
/// interprovincial aggregate.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SourceBundle {
    /// Date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    pub entries: Vec<SourceEntry>,
}

impl SourceBundle {
    pub fn new(local_date: String) -> Self {
        Self {
            local_date,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.entries.push(SourceEntry {
            name: name.into(),
            text: text.into(),
        });
    }

    pub fn extend(&mut self, entries: Vec<SourceEntry>) {
        self.entries.extend(entries);
    }

    /// Render the block the summarizer receives: one banner per source.
    pub fn to_digest_input(&self) -> String {
        let separator = "=".repeat(60);
        self.entries
            .iter()
            .map(|e| format!("{separator}\nSOURCE : {}\n{separator}\n{}", e.name, e.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A discrete order-in-council.
///
/// Records are deduplicated on [`OrderRecord::dedup_key`], a stable string
/// built from the title and date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrderRecord {
    pub title: String,
    pub date: String,
    pub number: String,
    pub link: String,
    pub summary: String,
}

impl OrderRecord {
    pub fn dedup_key(&self) -> String {
        format!("{}|{}", self.title.trim().to_lowercase(), self.date.trim())
    }
}

impl fmt::Display for OrderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.number.is_empty() {
            write!(f, "{}", self.title)?;
        } else {
            write!(f, "{} — {}", self.number, self.title)?;
        }
        if !self.date.is_empty() {
            write!(f, " ({})", self.date)?;
        }
        if !self.link.is_empty() {
            write!(f, "\n{}", self.link)?;
        }
        if !self.summary.is_empty() {
            write!(f, "\n{}", self.summary)?;
        }
        Ok(())
    }
}

/// A paragraph from another jurisdiction's source that names Ontario.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RelevanceMatch {
    pub province: String,
    pub source: String,
    pub url: String,
    pub excerpt: String,
}

impl fmt::Display for RelevanceMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PROVINCE : {}\nSOURCE   : {}\nURL      : {}\nEXTRAIT  :\n{}",
            self.province, self.source, self.url, self.excerpt
        )
    }
}

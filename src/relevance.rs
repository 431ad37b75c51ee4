//! Relevance Filter: keep only the paragraphs that name Ontario.
//!
//! This is a sampling mechanism for a reviewer, not full-text retrieval:
//! a missed mention is acceptable, a false positive is cheap to discard
//! downstream.

use crate::config::DEFAULT_KEYWORDS;
use crate::extract::in_stripped_region;
use crate::utils::{collapse_whitespace, truncate_chars};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};

/// Paragraph-like units shorter than this are ignored.
pub const MIN_PARAGRAPH_CHARS: usize = 30;

const BLOCK_SELECTOR: &str = "p, li, td, div";

static DEFAULT_SET: Lazy<KeywordSet> =
    Lazy::new(|| KeywordSet::new(DEFAULT_KEYWORDS).expect("default keywords compile"));

/// A case-insensitive set of literal keywords.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    pattern: Option<Regex>,
}

impl KeywordSet {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self, regex::Error> {
        let alternation = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");
        if alternation.is_empty() {
            return Ok(Self { pattern: None });
        }
        let pattern = RegexBuilder::new(&alternation).case_insensitive(true).build()?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// The built-in Ontario keyword set.
    pub fn ontario() -> &'static KeywordSet {
        &DEFAULT_SET
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }

    /// Matching paragraphs of `text`, joined by blank lines and cut to
    /// `max_chars`. Empty when nothing matches.
    pub fn filter(&self, text: &str, max_chars: usize) -> String {
        let kept: Vec<String> = paragraphs(text)
            .into_iter()
            .filter(|p| self.matches(p))
            .collect();
        truncate_chars(&kept.join("\n\n"), max_chars)
    }
}

/// Split input into paragraph-like units of at least
/// [`MIN_PARAGRAPH_CHARS`] characters.
///
/// HTML input (anything containing `<`) is split on block elements, taking
/// only innermost blocks so nested containers do not repeat their
/// children's text; plain text is split on lines.
pub fn paragraphs(text: &str) -> Vec<String> {
    let units = if text.contains('<') {
        html_blocks(text)
    } else {
        text.lines().map(|l| l.trim().to_string()).collect()
    };

    let mut seen = std::collections::HashSet::new();
    units
        .into_iter()
        .filter(|u| u.chars().count() >= MIN_PARAGRAPH_CHARS)
        .filter(|u| seen.insert(u.clone()))
        .collect()
}

fn html_blocks(html: &str) -> Vec<String> {
    let Ok(blocks) = Selector::parse(BLOCK_SELECTOR) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&blocks)
        .filter(|el| !in_stripped_region(el))
        .filter(|el| !has_block_child(el, &blocks))
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .collect()
}

fn has_block_child(el: &ElementRef<'_>, blocks: &Selector) -> bool {
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|d| blocks.matches(&d))
}

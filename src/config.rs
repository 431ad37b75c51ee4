//! Run settings: compile-time defaults with an optional YAML override.
//!
//! Every tunable the acquisition layer consumes lives here: the Hansard
//! recess gate, per-source character caps, the relevance keyword list,
//! politeness delays and per-mode timeouts. [`Settings::default`] is the
//! production configuration; a YAML file may override any subset of fields.
//!
//! ```yaml
//! hansard_resume_date: 2027-02-16
//! caps:
//!   hansard: 4000
//! politeness_delay_ms: 1500
//! ```

use chrono::NaiveDate;
use serde::Deserialize;
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

/// Keywords identifying Ontario, its government, its capital and its premier.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "ontario",
    "ontario's",
    "ontarian",
    "ontarien",
    "ontarienne",
    "toronto",
    "ottawa",
    "hamilton",
    "london",
    "windsor",
    "brampton",
    "doug ford",
    "ford government",
    "gouvernement ford",
    "queen's park",
    "queen’s park",
];

/// Per-source hard character caps.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Caps {
    pub news: usize,
    pub hansard: usize,
    pub gazette: usize,
    pub lobbyists: usize,
    pub regulations: usize,
    pub orders: usize,
    /// Budget for each interprovincial excerpt.
    pub relevance: usize,
    /// Tighter budget for the lightly covered territories.
    pub territory_relevance: usize,
    /// Bounded excerpt fetched from each order's own page.
    pub record_excerpt: usize,
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            news: 5000,
            hansard: 5000,
            gazette: 3000,
            lobbyists: 3000,
            regulations: 3000,
            orders: 3000,
            relevance: 800,
            territory_relevance: 400,
            record_excerpt: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// The legislature does not sit before this date; Hansard is not queried.
    pub hansard_resume_date: NaiveDate,
    pub caps: Caps,
    pub keywords: Vec<String>,
    /// Feed entries published within this many hours are always kept.
    pub feed_recency_hours: i64,
    /// Pause between dependent calls within one source.
    pub politeness_delay_ms: u64,
    /// Pause between jurisdictions in the interprovincial watcher.
    pub jurisdiction_delay_ms: u64,
    pub static_timeout_secs: u64,
    pub rendered_timeout_secs: u64,
    pub intercept_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hansard_resume_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap_or_default(),
            caps: Caps::default(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            feed_recency_hours: 36,
            politeness_delay_ms: 1000,
            jurisdiction_delay_ms: 500,
            static_timeout_secs: 15,
            rendered_timeout_secs: 45,
            intercept_timeout_secs: 45,
        }
    }
}

impl Settings {
    /// Load settings, overlaying the YAML file at `path` when one is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            info!("No config file given; using built-in settings");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&raw)?;
        info!(%path, resume = %settings.hansard_resume_date, "Loaded settings");
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn jurisdiction_delay(&self) -> Duration {
        Duration::from_millis(self.jurisdiction_delay_ms)
    }

    pub fn static_timeout(&self) -> Duration {
        Duration::from_secs(self.static_timeout_secs)
    }

    pub fn rendered_timeout(&self) -> Duration {
        Duration::from_secs(self.rendered_timeout_secs)
    }

    pub fn intercept_timeout(&self) -> Duration {
        Duration::from_secs(self.intercept_timeout_secs)
    }

    /// Settings with every pause removed, for tests.
    #[cfg(test)]
    pub fn without_delays() -> Self {
        Self {
            politeness_delay_ms: 0,
            jurisdiction_delay_ms: 0,
            ..Self::default()
        }
    }
}

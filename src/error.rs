//! Failure taxonomy for content acquisition.
//!
//! Nothing in the acquisition layer propagates a failure to the run. Every
//! suppression site produces an [`Unavailable`] value carrying a short,
//! human-readable reason, so callers (and tests) can tell *why* a source
//! came back empty.

use thiserror::Error;

/// The four kinds of acquisition failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, connection error, or non-2xx status.
    NetworkFailure,
    /// Malformed feed, HTML, or JSON.
    ParseFailure,
    /// Well-formed response with nothing usable in it.
    EmptyResult,
    /// The headless browser is not installed or could not start.
    CapabilityMissing,
}

/// Why a fetch or a strategy attempt produced no usable content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unavailable {
    #[error("network failure for {url}: {detail}")]
    Network { url: String, detail: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("could not parse {what}: {detail}")]
    Parse { what: String, detail: String },

    #[error("no usable content: {0}")]
    Empty(String),

    #[error("headless browser unavailable: {0}")]
    CapabilityMissing(String),
}

impl Unavailable {
    pub fn network(url: &str, detail: impl ToString) -> Self {
        Self::Network {
            url: url.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn parse(what: &str, detail: impl ToString) -> Self {
        Self::Parse {
            what: what.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn empty(detail: impl Into<String>) -> Self {
        Self::Empty(detail.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } | Self::Status { .. } => FailureKind::NetworkFailure,
            Self::Parse { .. } => FailureKind::ParseFailure,
            Self::Empty(_) => FailureKind::EmptyResult,
            Self::CapabilityMissing(_) => FailureKind::CapabilityMissing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_counts_as_network_failure() {
        let e = Unavailable::Status {
            url: "https://www.ola.org".to_string(),
            status: 503,
        };
        assert_eq!(e.kind(), FailureKind::NetworkFailure);
        assert_eq!(e.to_string(), "HTTP 503 from https://www.ola.org");
    }

    #[test]
    fn test_reasons_are_distinguishable() {
        let parse = Unavailable::parse("rss feed", "unexpected EOF");
        let empty = Unavailable::empty("feed has no entries");
        let missing = Unavailable::CapabilityMissing("chromium not found".to_string());

        assert_eq!(parse.kind(), FailureKind::ParseFailure);
        assert_eq!(empty.kind(), FailureKind::EmptyResult);
        assert_eq!(missing.kind(), FailureKind::CapabilityMissing);
        assert!(parse.to_string().contains("rss feed"));
    }
}

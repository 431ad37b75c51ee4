//! Command-line interface definitions for the Ontario digest collector.
//!
//! Every option can also come from the environment.

use clap::{Parser, ValueEnum};

/// Which orchestrators to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Only {
    All,
    Ontario,
    Interprovincial,
}

impl Only {
    pub fn ontario(self) -> bool {
        matches!(self, Self::All | Self::Ontario)
    }

    pub fn interprovincial(self) -> bool {
        matches!(self, Self::All | Self::Interprovincial)
    }
}

/// Collect the day's Ontario public-affairs sources and print the block
/// handed to the summarizer.
///
/// # Examples
///
/// ```sh
/// # Everything, printed to stdout
/// ontario_digest
///
/// # Also keep a JSON snapshot, without a headless browser
/// ontario_digest --json-output-dir ./snapshots --no-browser
///
/// # Only the interprovincial watcher, with overridden settings
/// ontario_digest --only interprovincial --config ./digest.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, env = "ONTARIO_DIGEST_CONFIG")]
    pub config: Option<String>,

    /// Directory for the dated JSON snapshot of the collected sources
    #[arg(short, long, env = "ONTARIO_DIGEST_JSON_DIR")]
    pub json_output_dir: Option<String>,

    /// Collect and print only; never write to disk
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Never launch a headless browser, even when one is installed
    #[arg(long)]
    pub no_browser: bool,

    /// Restrict the run to one orchestrator
    #[arg(long, value_enum, default_value_t = Only::All)]
    pub only: Only,
}

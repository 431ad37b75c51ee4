//! # Ontario Digest
//!
//! The content-acquisition layer of a daily Ontario political digest. It
//! turns a fixed list of heterogeneous, unreliable government web sources
//! into clean, bounded UTF-8 text blocks for a downstream summarizer.
//!
//! ## Features
//!
//! - Six Ontario sources (newsroom, Hansard, Gazette, lobbyist and
//!   regulatory registries, orders in council), each behind an ordered
//!   fetch strategy chain: feed → static HTML → rendered HTML →
//!   intercepted JSON API
//! - A cross-jurisdictional watcher that samples the official sources of
//!   the other provinces and territories for mentions of Ontario
//! - Optional headless Chromium (`--features browser`); without it, script
//!   rendered sources degrade to static HTTP
//! - Never fails a run because of a source: every failure becomes an
//!   explicit sentence in the digest
//!
//! ## Usage
//!
//! ```sh
//! ontario_digest --json-output-dir ./snapshots > digest-input.txt
//! ```
//!
//! ## Architecture
//!
//! 1. **Setup**: settings, one shared HTTP session, renderer selection
//! 2. **Ontario sources**: [`sources::ontario`], strictly sequential
//! 3. **Interprovincial watch**: [`sources::interprovincial`]
//! 4. **Output**: the banner-delimited block on stdout, plus an optional
//!    JSON snapshot

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod collector;
mod config;
mod error;
mod extract;
mod feed;
mod models;
mod outputs;
mod records;
mod relevance;
mod sources;
mod strategy;
#[cfg(test)]
mod testing;
mod transport;
mod utils;

use cli::Cli;
use collector::Collector;
use config::Settings;
use models::SourceBundle;
use outputs::json;
use transport::{HttpTransport, select_renderer};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ontario_digest starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.json_output_dir, dry_run = args.dry_run, only = ?args.only, "Parsed CLI arguments");

    let settings = Settings::load(args.config.as_deref())?;

    // Early check: fail before any network work if the snapshot can't be written
    let snapshot_dir = args.json_output_dir.as_deref().filter(|_| !args.dry_run);
    if let Some(dir) = snapshot_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "JSON output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let transport = HttpTransport::new()?;
    let renderer = select_renderer(args.no_browser);
    info!(renderer = renderer.name(), "Transport ready");
    let collector = Collector::new(transport, renderer, settings);

    let mut bundle = SourceBundle::new(Local::now().date_naive().to_string());

    if args.only.ontario() {
        bundle.extend(sources::ontario::fetch_ontario(&collector).await);
    }
    if args.only.interprovincial() {
        let report = sources::interprovincial::fetch_interprovincial(&collector).await;
        bundle.push(sources::interprovincial::ENTRY_NAME, report);
    }
    info!(entries = bundle.entries.len(), local_date = %bundle.local_date, "Sources collected");

    println!("{}", bundle.to_digest_input());

    if let Some(dir) = snapshot_dir {
        if let Err(e) = json::write_bundle(&bundle, dir).await {
            error!(error = %e, "Failed to write JSON snapshot");
        }
    } else if args.dry_run {
        info!("Dry run; nothing written to disk");
    }

    let elapsed = start_time.elapsed();
    info!(elapsed_secs = elapsed.as_secs_f64(), "Run complete");
    Ok(())
}

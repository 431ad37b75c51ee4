//! Orchestrators.
//!
//! - [`ontario`]: the six Ontario sources, each run through the fetch
//!   strategy chain, in fixed order
//! - [`interprovincial`]: the cross-jurisdictional watcher that samples
//!   other provinces' official sources for mentions of Ontario
//!
//! Both run sources strictly one after another and isolate each source
//! behind [`guarded`], so a panic in one parser costs that source only.

pub mod interprovincial;
pub mod ontario;

use crate::collector::Collector;
use crate::models::SourceEntry;
use crate::strategy::SourceDescriptor;
use crate::transport::Transport;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::error;

/// Placeholder for a source whose acquisition aborted unexpectedly.
pub const GENERIC_FAILURE: &str = "Source temporairement indisponible (erreur inattendue lors de la collecte).";

/// Await `fut`, converting a panic into `None`.
pub async fn guarded<F, O>(label: &str, fut: F) -> Option<O>
where
    F: Future<Output = O>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(out) => Some(out),
        Err(payload) => {
            error!(source = %label, reason = %panic_message(payload.as_ref()), "source aborted; substituting placeholder");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run every descriptor in order. Exactly one entry per descriptor, never
/// with empty text.
pub async fn fetch_sources<T: Transport>(
    collector: &Collector<T>,
    sources: &[SourceDescriptor],
) -> Vec<SourceEntry> {
    let mut entries = Vec::with_capacity(sources.len());
    for (i, source) in sources.iter().enumerate() {
        if i > 0 {
            collector.pause().await;
        }
        let text = guarded(&source.name, collector.fetch_source(source))
            .await
            .map(|outcome| outcome.into_text())
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        entries.push(SourceEntry {
            name: source.name.clone(),
            text,
        });
    }
    entries
}

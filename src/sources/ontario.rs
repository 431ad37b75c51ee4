//! The six Ontario sources, in the order the digest presents them.

use super::fetch_sources;
use crate::collector::Collector;
use crate::config::Settings;
use crate::feed::FeedWindow;
use crate::models::SourceEntry;
use crate::records::RecordRule;
use crate::strategy::{FetchStrategy, PageYield, SourceDescriptor};
use crate::transport::{ApiFilter, Transport};
use chrono::{Datelike, NaiveDate};
use tracing::{info, instrument};

pub const NEWS: &str = "Communiqués du gouvernement (news.ontario.ca)";
pub const HANSARD: &str = "Hansard — Assemblée législative de l'Ontario";
pub const GAZETTE: &str = "Gazette de l'Ontario";
pub const LOBBYISTS: &str = "Registre des lobbyistes";
pub const REGULATIONS: &str = "Registre de la réglementation de l'Ontario";
pub const ORDERS: &str = "Décrets du Conseil";

const NEWS_FEED: &str = "https://news.ontario.ca/en/rss";
const NEWSROOM: &str = "https://news.ontario.ca/en";

const HANSARD_INDEXES: &[&str] = &[
    "https://www.ola.org/en/legislative-business/house-documents/parliament-43/session-1/hansard",
    "https://www.ola.org/en/legislative-business/house-documents/parliament-43",
    "https://www.ola.org/en/legislative-business/house-documents",
];

const GAZETTE_PAGE: &str = "https://www.ontario.ca/page/ontario-gazette";

const LOBBYIST_PAGES: &[&str] = &[
    "https://www.ontario.ca/page/lobbyist-registry",
    "https://lobbyist.ontario.ca/lobbyistregistry/faces/publicregistration/searchRegistrations.xhtml",
];

const REGULATORY_REGISTRY: &str = "https://www.ontariocanada.com/registry/view.do";
const REGULATORY_PAGE: &str = "https://www.ontario.ca/page/ontario-regulatory-registry";

const ORDERS_SEARCH: &str = "https://www.ontario.ca/search/orders-in-council";

/// Orders kept per run; each costs one extra detail fetch.
const ORDERS_LIMIT: usize = 5;

/// Build the Ontario catalog for a run on `today`.
pub fn catalog(settings: &Settings, today: NaiveDate) -> Vec<SourceDescriptor> {
    let caps = &settings.caps;
    vec![
        SourceDescriptor::new(NEWS, caps.news, "Aucun communiqué récent.")
            .then(FetchStrategy::feed(
                NEWS_FEED,
                FeedWindow::hours(settings.feed_recency_hours),
            ))
            .then(FetchStrategy::static_page(NEWSROOM, PageYield::links(&["/release/"], 8)))
            .then(FetchStrategy::rendered_page(NEWSROOM, PageYield::links(&["/release/"], 8))),
        hansard(settings, today),
        SourceDescriptor::new(GAZETTE, caps.gazette, "Gazette de l'Ontario non disponible.")
            .then(FetchStrategy::static_text(GAZETTE_PAGE))
            .then(FetchStrategy::rendered_text(GAZETTE_PAGE)),
        SourceDescriptor::new(
            LOBBYISTS,
            caps.lobbyists,
            "Registre des lobbyistes non disponible aujourd'hui.",
        )
        .then(FetchStrategy::static_text(LOBBYIST_PAGES[0]))
        .then(FetchStrategy::static_text(LOBBYIST_PAGES[1]))
        .then(FetchStrategy::rendered_text(LOBBYIST_PAGES[1])),
        SourceDescriptor::new(
            REGULATIONS,
            caps.regulations,
            "Registre de la réglementation non disponible aujourd'hui.",
        )
        .then(
            FetchStrategy::static_text(REGULATORY_REGISTRY)
                .with_params(&[("language", "en"), ("status", "Posted")]),
        )
        .then(FetchStrategy::static_text(REGULATORY_PAGE))
        .then(FetchStrategy::rendered_text(REGULATORY_PAGE)),
        SourceDescriptor::new(ORDERS, caps.orders, "Page des Décrets du Conseil non disponible.")
            .then(FetchStrategy::intercepted(
                ORDERS_SEARCH,
                ApiFilter::new(&["/api/", "search", "orders-in-council"]),
                RecordRule {
                    path_marker: "orders-in-council".to_string(),
                    min_depth: 2,
                    limit: ORDERS_LIMIT,
                },
            ))
            .then(FetchStrategy::rendered_text(ORDERS_SEARCH))
            .then(FetchStrategy::static_text(ORDERS_SEARCH)),
    ]
}

fn hansard(settings: &Settings, today: NaiveDate) -> SourceDescriptor {
    let year = today.year().to_string();
    let last_year = (today.year() - 1).to_string();
    let markers = ["hansard", year.as_str(), last_year.as_str()];

    let resume = settings.hansard_resume_date;
    let gate_message = format!(
        "L'Assemblée législative de l'Ontario ne siège pas avant le {}. \
         Aucun Hansard n'est publié pendant la relâche.",
        resume.format("%Y-%m-%d")
    );

    HANSARD_INDEXES.iter().fold(
        SourceDescriptor::new(
            HANSARD,
            settings.caps.hansard,
            "Hansard non disponible (site OLA inaccessible).",
        )
        .gated(resume, gate_message),
        |source, index| source.then(FetchStrategy::static_page(index, PageYield::follow(&markers, "Hansard"))),
    )
}

/// Acquire every Ontario source, one entry per source, in catalog order.
#[instrument(level = "info", skip_all, fields(today = %collector.today()))]
pub async fn fetch_ontario<T: Transport>(collector: &Collector<T>) -> Vec<SourceEntry> {
    info!("Collecting Ontario sources");
    let sources = catalog(collector.settings(), collector.today());
    let entries = fetch_sources(collector, &sources).await;
    info!(count = entries.len(), "Ontario sources collected");
    entries
}

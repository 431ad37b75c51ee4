//! Cross-jurisdictional watcher.
//!
//! Samples the official sources of the other provinces and territories
//! (gazettes, Hansards, lobbyist registries, utility regulators, tender
//! boards) and keeps only the paragraphs that name Ontario. A sample that
//! fails or finds nothing contributes nothing; the report is never empty.

use super::guarded;
use crate::collector::{Collector, PageMode};
use crate::config::Settings;
use crate::error::Unavailable;
use crate::extract::find_links;
use crate::models::RelevanceMatch;
use crate::relevance::KeywordSet;
use crate::transport::Transport;
use crate::utils::truncate_chars;
use tracing::{debug, info, instrument, warn};

/// Name of the aggregated entry in the source bundle.
pub const ENTRY_NAME: &str = "Ontario ailleurs au Canada (sources interprovinciales)";

pub const NOTHING_FOUND: &str = "Aucune référence directe à l'Ontario détectée aujourd'hui \
     dans les sources officielles des autres provinces et territoires canadiens.";

/// Feed hits are shorter than page excerpts.
const FEED_EXCERPT_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleKind {
    Static,
    /// Headless render, static HTTP when no browser is available.
    Rendered,
    /// Look at the first `entries` feed entries; the first hit wins.
    Feed { entries: usize },
    /// Follow the first anchor whose URL carries a marker.
    FollowLink { markers: Vec<String> },
}

/// One official source of another jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub source: String,
    pub url: String,
    /// URL shown in the report; the site root rather than a search page.
    pub display_url: String,
    pub kind: SampleKind,
    pub max_chars: usize,
    /// Overrides the jurisdiction name in matches (the territories share
    /// one jurisdiction).
    pub region: Option<String>,
}

impl Sample {
    pub fn page(source: &str, url: &str, display_url: &str, max_chars: usize) -> Self {
        Self {
            source: source.to_string(),
            url: url.to_string(),
            display_url: display_url.to_string(),
            kind: SampleKind::Static,
            max_chars,
            region: None,
        }
    }

    pub fn feed(source: &str, url: &str, entries: usize, max_chars: usize) -> Self {
        Self {
            kind: SampleKind::Feed { entries },
            ..Self::page(source, url, url, max_chars)
        }
    }

    pub fn follow(source: &str, url: &str, markers: &[&str], max_chars: usize) -> Self {
        Self {
            kind: SampleKind::FollowLink {
                markers: markers.iter().map(|m| m.to_string()).collect(),
            },
            ..Self::page(source, url, url, max_chars)
        }
    }

    pub fn rendered(mut self) -> Self {
        self.kind = SampleKind::Rendered;
        self
    }

    pub fn in_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jurisdiction {
    pub name: String,
    pub samples: Vec<Sample>,
}

impl Jurisdiction {
    fn new(name: &str, samples: Vec<Sample>) -> Self {
        Self {
            name: name.to_string(),
            samples,
        }
    }
}

/// The watched jurisdictions, in report order.
pub fn catalog(settings: &Settings) -> Vec<Jurisdiction> {
    let budget = settings.caps.relevance;
    let territory = settings.caps.territory_relevance;
    let page = |source: &str, url: &str, display: &str| Sample::page(source, url, display, budget);

    vec![
        Jurisdiction::new(
            "Québec",
            vec![
                page(
                    "Gazette officielle du Québec",
                    "https://www.publicationsduquebec.gouv.qc.ca/home.php",
                    "https://www.publicationsduquebec.gouv.qc.ca",
                ),
                Sample::feed(
                    "Journal des débats de l'AN",
                    "https://www.assnat.qc.ca/fr/travaux-parlementaires/journaux-debats/rss.xml",
                    5,
                    budget,
                ),
                page(
                    "SEAO — Appels d'offres",
                    "https://www.seao.ca/OpportunityPublication/rechercheOc.aspx?lang=fr",
                    "https://www.seao.ca",
                )
                .rendered(),
            ],
        ),
        Jurisdiction::new(
            "Colombie-Britannique",
            vec![
                page(
                    "BC Gazette",
                    "https://www.bclaws.gov.bc.ca/civix/document/id/bcgaz1/bcgaz1/",
                    "https://www.bclaws.gov.bc.ca",
                ),
                Sample::follow(
                    "Hansard BC",
                    "https://www.leg.bc.ca/parliamentary-business/hansard-blues/house",
                    &["hansard", "debate"],
                    budget,
                ),
                page(
                    "Registre des lobbyistes de la C.-B.",
                    "https://www.lobbyistsregistrar.bc.ca/app/secure/orl/lrs/do/lbrSearch",
                    "https://www.lobbyistsregistrar.bc.ca",
                ),
                page(
                    "BC Utilities Commission",
                    "https://www.bcuc.com/OurWork/Applications",
                    "https://www.bcuc.com",
                ),
            ],
        ),
        Jurisdiction::new(
            "Alberta",
            vec![
                page(
                    "Alberta Gazette",
                    "https://open.alberta.ca/publications?subject=alberta-gazette",
                    "https://open.alberta.ca",
                ),
                page(
                    "Hansard de l'Assemblée de l'Alberta",
                    "https://www.assembly.ab.ca/assembly-business/hansard",
                    "https://www.assembly.ab.ca",
                ),
                page(
                    "Registre des lobbyistes de l'Alberta",
                    "https://www.lobbyists.alberta.ca/public/registrant-search",
                    "https://www.lobbyists.alberta.ca",
                ),
                page(
                    "Alberta Utilities Commission",
                    "https://www.auc.ab.ca/regulatory-documents",
                    "https://www.auc.ab.ca",
                ),
            ],
        ),
        Jurisdiction::new(
            "Manitoba",
            vec![
                page(
                    "Gazette du Manitoba",
                    "https://web2.gov.mb.ca/laws/gazette/index_gazette.php",
                    "https://web2.gov.mb.ca",
                ),
                Sample::follow(
                    "Hansard Manitoba",
                    "https://www.gov.mb.ca/legislature/hansard/index.html",
                    &["hansard", ".html"],
                    budget,
                ),
            ],
        ),
        Jurisdiction::new(
            "Saskatchewan",
            vec![
                page(
                    "Gazette de la Saskatchewan",
                    "https://publications.saskatchewan.ca/#/products?pageSize=20&keyword=gazette",
                    "https://publications.saskatchewan.ca",
                )
                .rendered(),
                page(
                    "Hansard de la Saskatchewan",
                    "https://www.legassembly.sk.ca/legislative-business/hansard/",
                    "https://www.legassembly.sk.ca",
                ),
            ],
        ),
        Jurisdiction::new(
            "Nouvelle-Écosse",
            vec![
                page(
                    "Hansard de la Nouvelle-Écosse",
                    "https://nslegislature.ca/legislative-business/hansard",
                    "https://nslegislature.ca",
                ),
                page(
                    "NS Utility and Review Board",
                    "https://nsuarb.novascotia.ca/hearings",
                    "https://nsuarb.novascotia.ca",
                ),
            ],
        ),
        Jurisdiction::new(
            "Nouveau-Brunswick",
            vec![
                page(
                    "Hansard du N.-B.",
                    "https://www.gnb.ca/legis/hansard/index-f.asp",
                    "https://www.gnb.ca/legis/hansard/",
                ),
                page(
                    "Gazette royale du N.-B.",
                    "https://www.gnb.ca/gazette/index-f.asp",
                    "https://www.gnb.ca/gazette/",
                ),
            ],
        ),
        Jurisdiction::new(
            "Île-du-Prince-Édouard",
            vec![page(
                "Hansard de l'ÎPÉ",
                "https://www.assembly.pe.ca/hansard",
                "https://www.assembly.pe.ca",
            )],
        ),
        Jurisdiction::new(
            "Terre-Neuve-et-Labrador",
            vec![
                page(
                    "Hansard de T.-N.-L.",
                    "https://www.assembly.nl.ca/HouseBusiness/Hansard",
                    "https://www.assembly.nl.ca",
                ),
                page(
                    "NL Public Utilities Board",
                    "https://pub.nl.ca/applications/",
                    "https://pub.nl.ca",
                ),
            ],
        ),
        Jurisdiction::new(
            "Territoires",
            [
                ("Yukon", "Assemblée législative du Yukon", "https://yukonassembly.ca/house-business/hansard"),
                ("T.N.-O.", "Assemblée législative des T.N.-O.", "https://www.ntassembly.ca/content/hansard"),
                ("Nunavut", "Assemblée législative du Nunavut", "https://www.assembly.nu.ca/hansard"),
            ]
            .into_iter()
            .map(|(region, source, url)| Sample::page(source, url, url, territory).in_region(region))
            .collect(),
        ),
    ]
}

/// Run every sample of every jurisdiction, in order, collecting matches.
///
/// A panic inside one jurisdiction drops that jurisdiction's matches only.
pub async fn watch<T: Transport>(
    collector: &Collector<T>,
    jurisdictions: &[Jurisdiction],
    keywords: &KeywordSet,
) -> Vec<RelevanceMatch> {
    let mut matches = Vec::new();
    for (i, jurisdiction) in jurisdictions.iter().enumerate() {
        if i > 0 {
            collector.pause_between_jurisdictions().await;
        }
        let Some(found) = guarded(
            &jurisdiction.name,
            scan_jurisdiction(collector, jurisdiction, keywords),
        )
        .await
        else {
            continue;
        };
        if !found.is_empty() {
            info!(jurisdiction = %jurisdiction.name, count = found.len(), "references to Ontario found");
        }
        matches.extend(found);
    }
    matches
}

#[instrument(level = "info", skip_all, fields(jurisdiction = %jurisdiction.name))]
async fn scan_jurisdiction<T: Transport>(
    collector: &Collector<T>,
    jurisdiction: &Jurisdiction,
    keywords: &KeywordSet,
) -> Vec<RelevanceMatch> {
    let mut found = Vec::new();
    for sample in &jurisdiction.samples {
        match run_sample(collector, sample, keywords).await {
            Ok(Some((source, url, excerpt))) => found.push(RelevanceMatch {
                province: sample.region.clone().unwrap_or_else(|| jurisdiction.name.clone()),
                source,
                url,
                excerpt,
            }),
            Ok(None) => debug!(source = %sample.source, "no mention of Ontario"),
            Err(e) => warn!(source = %sample.source, url = %sample.url, error = %e, "sample failed"),
        }
    }
    found
}

/// `(source label, URL, excerpt)` of a sample's hit, if any.
async fn run_sample<T: Transport>(
    collector: &Collector<T>,
    sample: &Sample,
    keywords: &KeywordSet,
) -> Result<Option<(String, String, String)>, Unavailable> {
    let hit = |source: String, url: String, excerpt: String| {
        (!excerpt.is_empty()).then_some((source, url, excerpt))
    };

    match &sample.kind {
        SampleKind::Static | SampleKind::Rendered => {
            let mode = if sample.kind == SampleKind::Rendered {
                PageMode::Rendered
            } else {
                PageMode::Static
            };
            let page = collector.page(&sample.url, mode).await?;
            Ok(hit(
                sample.source.clone(),
                sample.display_url.clone(),
                keywords.filter(&page.html, sample.max_chars),
            ))
        }
        SampleKind::Feed { entries } => {
            let feed = collector.feed_entries(&sample.url).await?;
            Ok(feed.iter().take(*entries).find_map(|entry| {
                let text = format!("{} {}", entry.summary, entry.title);
                let excerpt = keywords.filter(&text, sample.max_chars);
                hit(
                    sample.source.clone(),
                    entry.link.clone(),
                    truncate_chars(&excerpt, FEED_EXCERPT_CHARS),
                )
            }))
        }
        SampleKind::FollowLink { markers } => {
            let index = collector.page(&sample.url, PageMode::Static).await?;
            let markers: Vec<&str> = markers.iter().map(String::as_str).collect();
            let Some(link) = find_links(&index.html, &index.url, &markers, 1).into_iter().next() else {
                return Err(Unavailable::empty("no linked transcript on the index page"));
            };
            collector.pause().await;
            let page = collector.page(&link.url, PageMode::Static).await?;
            Ok(hit(
                format!("{} — {}", sample.source, link.title),
                link.url,
                keywords.filter(&page.html, sample.max_chars),
            ))
        }
    }
}

/// The aggregated block: a count header and the matches separated by a
/// dashed rule, or [`NOTHING_FOUND`].
pub fn render_report(matches: &[RelevanceMatch]) -> String {
    if matches.is_empty() {
        return NOTHING_FOUND.to_string();
    }
    let separator = format!("\n{}\n", "-".repeat(50));
    let body = matches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&separator);
    format!(
        "[{} référence(s) à l'Ontario détectée(s) hors Ontario]\n\n{body}",
        matches.len()
    )
}

/// Run the watcher with the configured keywords and render its report.
#[instrument(level = "info", skip_all)]
pub async fn fetch_interprovincial<T: Transport>(collector: &Collector<T>) -> String {
    let settings = collector.settings();
    let configured;
    let keywords = match KeywordSet::new(&settings.keywords) {
        Ok(set) => {
            configured = set;
            &configured
        }
        Err(e) => {
            warn!(error = %e, "configured keywords do not compile; using built-in set");
            KeywordSet::ontario()
        }
    };

    let jurisdictions = catalog(settings);
    info!(jurisdictions = jurisdictions.len(), "Watching other jurisdictions");
    let matches = watch(collector, &jurisdictions, keywords).await;
    info!(count = matches.len(), "Interprovincial watch complete");
    render_report(&matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTransport, collector};

    const ALBERTA: &str = "https://www.auc.ab.ca/regulatory-documents";

    fn alberta(url: &str) -> Vec<Jurisdiction> {
        vec![Jurisdiction::new(
            "Alberta",
            vec![Sample::page("Alberta Utilities Commission", url, "https://www.auc.ab.ca", 800)],
        )]
    }

    #[test]
    fn test_catalog_covers_ten_jurisdictions() {
        let jurisdictions = catalog(&Settings::default());
        let names: Vec<_> = jurisdictions.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Québec",
                "Colombie-Britannique",
                "Alberta",
                "Manitoba",
                "Saskatchewan",
                "Nouvelle-Écosse",
                "Nouveau-Brunswick",
                "Île-du-Prince-Édouard",
                "Terre-Neuve-et-Labrador",
                "Territoires",
            ]
        );
        let territories = &jurisdictions[9];
        assert!(territories.samples.iter().all(|p| p.max_chars == 400 && p.region.is_some()));
        assert_eq!(jurisdictions[0].samples[2].kind, SampleKind::Rendered);
    }

    #[tokio::test]
    async fn test_matching_paragraph_becomes_a_match() {
        let html = "<html><body>\
            <p>The Commission approved the Ontario intertie feasibility study.</p>\
            <p>Rate application for a gas utility in Calgary was adjourned.</p>\
            </body></html>";
        let c = collector(FakeTransport::new().page(ALBERTA, html));

        let matches = watch(&c, &alberta(ALBERTA), KeywordSet::ontario()).await;
        assert_eq!(
            matches,
            vec![RelevanceMatch {
                province: "Alberta".to_string(),
                source: "Alberta Utilities Commission".to_string(),
                url: "https://www.auc.ab.ca".to_string(),
                excerpt: "The Commission approved the Ontario intertie feasibility study.".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_nothing_found_sentence() {
        let html = "<p>Rate application for a gas utility in Calgary was adjourned.</p>";
        let c = collector(FakeTransport::new().page(ALBERTA, html));

        let matches = watch(&c, &alberta(ALBERTA), KeywordSet::ontario()).await;
        assert!(matches.is_empty());
        assert_eq!(render_report(&matches), NOTHING_FOUND);
    }

    #[tokio::test]
    async fn test_feed_sample_keeps_first_hit_only() {
        let url = "https://www.assnat.qc.ca/fr/travaux-parlementaires/journaux-debats/rss.xml";
        let feed = crate::feed::fixtures::rss(&[
            ("Séance sur l'entente énergétique avec l'Ontario", "Thu, 15 Oct 2026 20:00:00 -0400"),
            ("Deuxième séance sur l'Ontario et le commerce", "Wed, 14 Oct 2026 20:00:00 -0400"),
        ]);
        let c = collector(FakeTransport::new().page(url, &feed));
        let jurisdictions = vec![Jurisdiction::new(
            "Québec",
            vec![Sample::feed("Journal des débats de l'AN", url, 5, 800)],
        )];

        let matches = watch(&c, &jurisdictions, KeywordSet::ontario()).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].url, "https://news.ontario.ca/en/release/0");
        assert!(matches[0].excerpt.contains("entente énergétique"));
    }

    #[tokio::test]
    async fn test_follow_link_sample_labels_with_anchor_text() {
        let index = "https://www.leg.bc.ca/parliamentary-business/hansard-blues/house";
        let target = "https://www.leg.bc.ca/hansard-content/2026-10-15-am";
        let transport = FakeTransport::new()
            .page(index, r#"<a href="/hansard-content/2026-10-15-am">Thursday, October 15, 2026 (AM)</a>"#)
            .page(target, "<p>The member compared our housing starts with Ontario's results.</p>");
        let c = collector(transport);
        let jurisdictions = vec![Jurisdiction::new(
            "Colombie-Britannique",
            vec![Sample::follow("Hansard BC", index, &["hansard", "debate"], 800)],
        )];

        let matches = watch(&c, &jurisdictions, KeywordSet::ontario()).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].source, "Hansard BC — Thursday, October 15, 2026 (AM)");
        assert_eq!(matches[0].url, target);
    }

    #[tokio::test]
    async fn test_failing_and_panicking_jurisdictions_are_skipped() {
        let good = "https://www.assembly.pe.ca/hansard";
        let transport = FakeTransport::new()
            .panic_on("https://nslegislature.ca/legislative-business/hansard")
            .status("https://www.gnb.ca/legis/hansard/index-f.asp", 500)
            .page(good, "<p>Premier King met with Premier Ford to discuss Ontario trade.</p>");
        let c = collector(transport);
        let jurisdictions = vec![
            Jurisdiction::new(
                "Nouvelle-Écosse",
                vec![Sample::page("Hansard NS", "https://nslegislature.ca/legislative-business/hansard", "https://nslegislature.ca", 800)],
            ),
            Jurisdiction::new(
                "Nouveau-Brunswick",
                vec![Sample::page("Hansard du N.-B.", "https://www.gnb.ca/legis/hansard/index-f.asp", "https://www.gnb.ca", 800)],
            ),
            Jurisdiction::new(
                "Île-du-Prince-Édouard",
                vec![Sample::page("Hansard de l'ÎPÉ", good, "https://www.assembly.pe.ca", 800)],
            ),
        ];

        let matches = watch(&c, &jurisdictions, KeywordSet::ontario()).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].province, "Île-du-Prince-Édouard");
    }

    #[test]
    fn test_report_header_and_separator() {
        let m = |p: &str| RelevanceMatch {
            province: p.to_string(),
            source: "Gazette".to_string(),
            url: "https://example.gc.ca".to_string(),
            excerpt: "Accord with Ontario on interprovincial trade barriers.".to_string(),
        };
        let report = render_report(&[m("Manitoba"), m("Yukon")]);
        assert!(report.starts_with("[2 référence(s) à l'Ontario détectée(s) hors Ontario]\n\nPROVINCE : Manitoba"));
        assert_eq!(report.matches(&"-".repeat(50)).count(), 1);
        assert!(report.contains(&format!("\n{}\nPROVINCE : Yukon", "-".repeat(50))));
    }

    #[tokio::test]
    async fn test_full_watch_without_network_reports_nothing() {
        let c = collector(FakeTransport::new());
        assert_eq!(fetch_interprovincial(&c).await, NOTHING_FOUND);
        assert!(!c.transport().calls().is_empty());
    }
}

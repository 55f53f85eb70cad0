//! Depth-bounded site crawler.
//!
//! Walks a company website from its seed page with an explicit work stack,
//! staying on the seed's host and its subdomains. It classifies every visited page, scores the PDF links it finds and hands
//! eligible ones to a [`DocumentProcessor`]. Page and document failures are
//! recorded in the error ledger and never abort the crawl.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use super::links::{extract_links, is_pdf_url, site_domain, Link};
use super::visited::VisitedSet;
use super::FetchError;
use crate::config::CrawlSettings;
use crate::models::{CandidateDocument, CrawlTarget, MinedFigures, PageContext};
use crate::repository::ErrorLedgerRepository;
use crate::scoring::relevance::has_priority_keyword;
use crate::scoring::{classify_page, score};
use crate::services::processor::{ProcessError, ProcessOutcome};

/// Source of HTML pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;
}

/// Turns an eligible candidate into validated figures.
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    async fn process(
        &self,
        target: &CrawlTarget,
        candidate: &CandidateDocument,
    ) -> Result<ProcessOutcome, ProcessError>;
}

/// Figures accepted from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct MinedDocument {
    pub url: String,
    pub figures: MinedFigures,
}

/// Summary of one company crawl.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub company_id: i32,
    pub pages_visited: usize,
    pub pdf_links_seen: usize,
    pub documents_processed: usize,
    pub documents: Vec<MinedDocument>,
    pub rejected: usize,
    pub failures: usize,
}

impl CrawlReport {
    fn new(company_id: i32) -> Self {
        Self {
            company_id,
            ..Default::default()
        }
    }

    /// Fold a follow-up report (such as a ledger retry) into this one.
    pub fn absorb(&mut self, other: CrawlReport) {
        self.pages_visited += other.pages_visited;
        self.pdf_links_seen += other.pdf_links_seen;
        self.documents_processed += other.documents_processed;
        self.documents.extend(other.documents);
        self.rejected += other.rejected;
        self.failures += other.failures;
    }
}

/// A page waiting to be visited.
#[derive(Debug)]
struct WorkItem {
    url: Url,
    depth: u32,
}

pub struct SiteCrawler {
    fetcher: Arc<dyn PageFetcher>,
    processor: Arc<dyn DocumentProcessor>,
    ledger: Option<ErrorLedgerRepository>,
    settings: CrawlSettings,
}

impl SiteCrawler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        processor: Arc<dyn DocumentProcessor>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            fetcher,
            processor,
            ledger: None,
            settings,
        }
    }

    /// Record page and document failures in this ledger.
    pub fn with_ledger(mut self, ledger: ErrorLedgerRepository) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Crawl a company site and return the figures accepted along the way.
    pub async fn crawl(&self, target: &CrawlTarget) -> CrawlReport {
        let mut report = CrawlReport::new(target.company_id);

        let seed = match Url::parse(&target.seed_url) {
            Ok(url) => url,
            Err(e) => {
                self.record_failure(target, &target.seed_url, &format!("Invalid seed URL: {}", e))
                    .await;
                report.failures += 1;
                return report;
            }
        };

        let max_depth = self.settings.max_depth(target.size_class);
        let link_cap = self.settings.link_cap(target.size_class);
        let site = site_domain(&seed);
        // Pages are marked when queued, so each keeps the shallowest depth it was found at
        let mut visited = VisitedSet::new();
        visited.insert(&seed);
        let mut stack = vec![WorkItem {
            url: seed,
            depth: 0,
        }];

        info!(
            company_id = target.company_id,
            ticker = %target.ticker,
            size = target.size_class.as_str(),
            max_depth,
            "Starting crawl of {}",
            target.seed_url
        );

        while let Some(item) = stack.pop() {
            let Some(children) = self
                .visit_page(target, &item.url, &site, &mut visited, &mut report)
                .await
            else {
                continue;
            };

            if item.depth >= max_depth {
                continue;
            }

            let unvisited = children
                .into_iter()
                .filter(|link| !visited.contains(&link.url));
            let next: Vec<Link> = if item.depth == 0 {
                let (priority, generic): (Vec<Link>, Vec<Link>) =
                    unvisited.partition(is_priority_link);
                debug!(
                    company_id = target.company_id,
                    priority = priority.len(),
                    generic = generic.len(),
                    "Seed page links"
                );
                // Priority links go first and are never cut by the cap
                let room = link_cap.saturating_sub(priority.len());
                priority
                    .into_iter()
                    .chain(generic.into_iter().take(room))
                    .collect()
            } else {
                unvisited.take(link_cap).collect()
            };

            let queued: Vec<Url> = next
                .into_iter()
                .filter(|link| visited.insert(&link.url))
                .map(|link| link.url)
                .collect();
            // Reverse so the first link is popped first
            for url in queued.into_iter().rev() {
                stack.push(WorkItem {
                    url,
                    depth: item.depth + 1,
                });
            }
        }

        info!(
            company_id = target.company_id,
            pages = report.pages_visited,
            documents = report.documents_processed,
            accepted = report.documents.len(),
            rejected = report.rejected,
            failures = report.failures,
            "Crawl complete"
        );
        report
    }

    /// Re-attempt a URL from the error ledger once.
    ///
    /// PDF URLs are processed directly; page URLs are fetched and their
    /// eligible PDFs processed without following further links. A success
    /// resolves the ledger entry and a failure bumps its retry count.
    pub async fn retry_url(&self, target: &CrawlTarget, url: &str) -> CrawlReport {
        let mut report = CrawlReport::new(target.company_id);
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.record_failure(target, url, &format!("Invalid URL: {}", e)).await;
                report.failures += 1;
                return report;
            }
        };

        let site = Url::parse(&target.seed_url)
            .map(|seed| site_domain(&seed))
            .unwrap_or_else(|_| site_domain(&parsed));
        let mut visited = VisitedSet::new();
        visited.insert(&parsed);

        if is_pdf_url(&parsed) {
            let candidate = CandidateDocument {
                url: parsed.to_string(),
                anchor_text: String::new(),
                source_page: String::new(),
                context: PageContext::unknown(),
                score: 0,
                from_priority_page: false,
            };
            self.process_candidate(target, &candidate, &mut report).await;
        } else {
            self.visit_page(target, &parsed, &site, &mut visited, &mut report)
                .await;
        }

        if report.failures == 0 {
            if let Some(ledger) = &self.ledger {
                if let Err(e) = ledger.mark_resolved(target.company_id, url).await {
                    warn!("Failed to resolve ledger entry for {}: {}", url, e);
                }
            }
        }
        report
    }

    /// Fetch and classify one page, process its eligible PDFs, and return
    /// its same-site page links. `None` if the page could not be fetched.
    async fn visit_page(
        &self,
        target: &CrawlTarget,
        url: &Url,
        site: &str,
        visited: &mut VisitedSet,
        report: &mut CrawlReport,
    ) -> Option<Vec<Link>> {
        let html = match self.fetcher.fetch_page(url).await {
            Ok(html) => html,
            Err(FetchError::NotHtml { content_type, .. }) => {
                debug!(url = %url, content_type, "Skipping non-HTML page");
                return None;
            }
            Err(e) => {
                warn!(category = "fetch", company_id = target.company_id, url = %url, "{}", e);
                self.record_failure(target, url.as_str(), &e.to_string()).await;
                report.failures += 1;
                return None;
            }
        };

        report.pages_visited += 1;
        let links = extract_links(&html, url, site);
        let context = classify_page(&links.title, url.as_str());
        debug!(
            url = %url,
            kind = context.kind.as_str(),
            pdfs = links.pdf_links.len(),
            pages = links.page_links.len(),
            "Visited page"
        );

        for link in &links.pdf_links {
            if visited.contains(&link.url) {
                continue;
            }
            report.pdf_links_seen += 1;

            let relevance = score(link.url.as_str(), &link.text, &context, url.path());
            if !relevance.is_eligible() {
                debug!(url = %link.url, total = relevance.total(), "Skipping ineligible PDF");
                continue;
            }
            visited.insert(&link.url);

            let candidate = CandidateDocument {
                url: link.url.to_string(),
                anchor_text: link.text.clone(),
                source_page: url.to_string(),
                context,
                score: relevance.total(),
                from_priority_page: relevance.from_priority_page,
            };
            self.process_candidate(target, &candidate, report).await;
        }

        Some(links.page_links)
    }

    async fn process_candidate(
        &self,
        target: &CrawlTarget,
        candidate: &CandidateDocument,
        report: &mut CrawlReport,
    ) {
        report.documents_processed += 1;
        match self.processor.process(target, candidate).await {
            Ok(ProcessOutcome::Accepted(figures)) => {
                report.documents.push(MinedDocument {
                    url: candidate.url.clone(),
                    figures,
                });
            }
            Ok(ProcessOutcome::Rejected(_)) => report.rejected += 1,
            Ok(ProcessOutcome::NoFigures) => {}
            Err(e) => {
                self.record_failure(target, &candidate.url, &e.to_string()).await;
                report.failures += 1;
            }
        }
    }

    async fn record_failure(&self, target: &CrawlTarget, url: &str, message: &str) {
        if let Some(ledger) = &self.ledger {
            if let Err(e) = ledger.record(target.company_id, url, message).await {
                warn!("Failed to record error for {}: {}", url, e);
            }
        }
    }
}

fn is_priority_link(link: &Link) -> bool {
    has_priority_keyword(link.url.as_str()) || has_priority_keyword(&link.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SizeClass;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapFetcher {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl MapFetcher {
        fn new(pages: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .iter()
                    .map(|(u, h)| (u.to_string(), h.to_string()))
                    .collect(),
                fetched: Mutex::new(Vec::new()),
            })
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    #[derive(Default)]
    struct CountingProcessor {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DocumentProcessor for CountingProcessor {
        async fn process(
            &self,
            _target: &CrawlTarget,
            candidate: &CandidateDocument,
        ) -> Result<ProcessOutcome, ProcessError> {
            self.seen.lock().unwrap().push(candidate.url.clone());
            Ok(ProcessOutcome::NoFigures)
        }
    }

    fn target(size_class: SizeClass) -> CrawlTarget {
        CrawlTarget {
            company_id: 1,
            ticker: "EXG".to_string(),
            seed_url: "https://example.com/".to_string(),
            size_class,
            description: "gold".to_string(),
        }
    }

    fn page(title: &str, hrefs: &[&str]) -> String {
        let anchors: String = hrefs
            .iter()
            .map(|h| format!(r#"<a href="{}">{}</a>"#, h, h))
            .collect();
        format!("<html><head><title>{}</title></head><body>{}</body></html>", title, anchors)
    }

    #[tokio::test]
    async fn test_cycles_fetch_each_page_once() {
        let home = page("Home", &["/about", "/projects"]);
        let about = page("About", &["/", "/projects"]);
        let projects = page("Projects", &["/about", "/"]);
        let fetcher = MapFetcher::new(&[
            ("https://example.com/", &home),
            ("https://example.com/about", &about),
            ("https://example.com/projects", &projects),
        ]);
        let processor = Arc::new(CountingProcessor::default());
        let crawler = SiteCrawler::new(fetcher.clone(), processor, CrawlSettings::default());

        let report = crawler.crawl(&target(SizeClass::Large)).await;

        let fetched = fetcher.fetched();
        assert_eq!(fetched.len(), 3);
        assert_eq!(report.pages_visited, 3);
        let mut unique = fetched.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), fetched.len());
    }

    #[tokio::test]
    async fn test_small_target_depth_bound() {
        let home = page("Home", &["/level1"]);
        let level1 = page("Level 1", &["/level2"]);
        let level2 = page("Level 2", &[]);
        let fetcher = MapFetcher::new(&[
            ("https://example.com/", &home),
            ("https://example.com/level1", &level1),
            ("https://example.com/level2", &level2),
        ]);
        let crawler = SiteCrawler::new(
            fetcher.clone(),
            Arc::new(CountingProcessor::default()),
            CrawlSettings::default(),
        );

        crawler.crawl(&target(SizeClass::Small)).await;
        assert_eq!(
            fetcher.fetched(),
            vec!["https://example.com/", "https://example.com/level1"]
        );
    }

    #[tokio::test]
    async fn test_priority_links_visited_first() {
        let home = page("Home", &["/about", "/careers", "/investors"]);
        let fetcher = MapFetcher::new(&[("https://example.com/", &home)]);
        let crawler = SiteCrawler::new(
            fetcher.clone(),
            Arc::new(CountingProcessor::default()),
            CrawlSettings::default(),
        );

        crawler.crawl(&target(SizeClass::Large)).await;
        let fetched = fetcher.fetched();
        assert_eq!(fetched[0], "https://example.com/");
        assert_eq!(fetched[1], "https://example.com/investors");
        assert_eq!(fetched[2], "https://example.com/about");
    }

    #[tokio::test]
    async fn test_late_priority_link_survives_link_cap() {
        let mut hrefs: Vec<String> = (0..25).map(|i| format!("/page{}", i)).collect();
        hrefs.push("/investors".to_string());
        let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
        let home = page("Home", &href_refs);
        let fetcher = MapFetcher::new(&[("https://example.com/", &home)]);
        let crawler = SiteCrawler::new(
            fetcher.clone(),
            Arc::new(CountingProcessor::default()),
            CrawlSettings::default(),
        );

        crawler.crawl(&target(SizeClass::Large)).await;

        let fetched = fetcher.fetched();
        assert_eq!(fetched[1], "https://example.com/investors");
        // Seed plus the large-target cap of 20, priority link included
        assert_eq!(fetched.len(), 21);
        assert_eq!(fetched[2], "https://example.com/page0");
        assert!(!fetched.contains(&"https://example.com/page19".to_string()));
    }

    #[tokio::test]
    async fn test_seed_link_keeps_shallowest_depth() {
        // /b is linked from the seed and again from its sibling /a
        let home = page("Home", &["/a", "/b"]);
        let a = page("A", &["/b"]);
        let b = page("B", &["/c"]);
        let c = page("C", &["/d"]);
        let d = page("D", &[]);
        let fetcher = MapFetcher::new(&[
            ("https://example.com/", &home),
            ("https://example.com/a", &a),
            ("https://example.com/b", &b),
            ("https://example.com/c", &c),
            ("https://example.com/d", &d),
        ]);
        let crawler = SiteCrawler::new(
            fetcher.clone(),
            Arc::new(CountingProcessor::default()),
            CrawlSettings::default(),
        );

        let report = crawler.crawl(&target(SizeClass::Large)).await;

        // /b at depth 1 leaves room for /c at 2 and /d at 3
        assert!(fetcher.fetched().contains(&"https://example.com/d".to_string()));
        assert_eq!(report.pages_visited, 5);
    }

    #[tokio::test]
    async fn test_off_site_links_not_followed() {
        let home = page("Home", &["https://www.notexample.com/x", "https://ir.example.com/"]);
        let fetcher = MapFetcher::new(&[("https://example.com/", &home)]);
        let crawler = SiteCrawler::new(
            fetcher.clone(),
            Arc::new(CountingProcessor::default()),
            CrawlSettings::default(),
        );

        crawler.crawl(&target(SizeClass::Small)).await;
        assert_eq!(
            fetcher.fetched(),
            vec!["https://example.com/", "https://ir.example.com/"]
        );
    }

    #[tokio::test]
    async fn test_only_eligible_pdfs_are_processed() {
        let home = page(
            "Home",
            &[
                "/docs/ni-43-101-technical-report-gold.pdf",
                "/docs/sustainability-report-gold.pdf",
                "/docs/logo.pdf",
            ],
        );
        let fetcher = MapFetcher::new(&[("https://example.com/", &home)]);
        let processor = Arc::new(CountingProcessor::default());
        let crawler = SiteCrawler::new(fetcher, processor.clone(), CrawlSettings::default());

        let report = crawler.crawl(&target(SizeClass::Small)).await;
        assert_eq!(report.pdf_links_seen, 3);
        assert_eq!(
            *processor.seen.lock().unwrap(),
            vec!["https://example.com/docs/ni-43-101-technical-report-gold.pdf"]
        );
    }

    #[tokio::test]
    async fn test_page_failure_does_not_abort() {
        let home = page("Home", &["/missing", "/projects"]);
        let projects = page("Projects", &[]);
        let fetcher = MapFetcher::new(&[
            ("https://example.com/", &home),
            ("https://example.com/projects", &projects),
        ]);
        let crawler = SiteCrawler::new(
            fetcher.clone(),
            Arc::new(CountingProcessor::default()),
            CrawlSettings::default(),
        );

        let report = crawler.crawl(&target(SizeClass::Small)).await;
        assert_eq!(report.failures, 1);
        assert_eq!(report.pages_visited, 2);
    }
}

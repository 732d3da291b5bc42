//! The ingestion cycle: fetch listing pages, extract candidates, filter
//! by relevance, dedup and persist. Sources are processed sequentially in
//! registry order so per-site rate limits hold and title collisions
//! resolve deterministically. A failing or stalled source is skipped;
//! the cycle itself only fails on setup-level errors.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::classify::classify;
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::extract::{clean_text, extract_candidates, extract_content};
use crate::fetch::PageSource;
use crate::models::NewArticle;
use crate::sites::SiteConfig;

/// Counters returned to the scheduler after one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Relevant, in-run-unique candidates discovered.
    pub found: usize,
    /// Articles actually inserted (found minus cross-run duplicates and
    /// persistence failures).
    pub saved: usize,
}

pub struct Pipeline<'a, P> {
    pages: P,
    repo: &'a Repository,
    sites: Vec<SiteConfig>,
    inter_request_delay: Duration,
    max_candidates: usize,
    per_source_ceiling: Duration,
}

impl<'a, P: PageSource> Pipeline<'a, P> {
    pub fn new(pages: P, repo: &'a Repository, sites: Vec<SiteConfig>, config: &Config) -> Self {
        Self {
            pages,
            repo,
            sites,
            inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
            max_candidates: config.max_candidates_per_page,
            per_source_ceiling: Duration::from_secs(config.per_source_time_ceiling_secs),
        }
    }

    /// Run one full scrape over all configured sources.
    pub async fn run_ingestion_cycle(&self) -> Result<IngestReport> {
        let mut seen_titles: HashSet<String> = HashSet::new();
        let mut report = IngestReport::default();

        info!(sources = self.sites.len(), "starting ingestion cycle");

        for site in &self.sites {
            tokio::time::sleep(site.rate_limit).await;

            let outcome = tokio::time::timeout(
                self.per_source_ceiling,
                self.ingest_site(site, &mut seen_titles, &mut report),
            )
            .await;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(source = %site.source, error = %e, "source skipped"),
                Err(_) => warn!(source = %site.source, "source exceeded time ceiling, skipping"),
            }
        }

        info!(found = report.found, saved = report.saved, "ingestion cycle finished");

        if let Err(e) = self
            .repo
            .log_activity(
                "Ingestion cycle".to_string(),
                Some(format!("Found: {}, Saved: {}", report.found, report.saved)),
            )
            .await
        {
            error!(error = %e, "failed to record cycle in activity log");
        }

        Ok(report)
    }

    async fn ingest_site(
        &self,
        site: &SiteConfig,
        seen_titles: &mut HashSet<String>,
        report: &mut IngestReport,
    ) -> Result<()> {
        info!(source = %site.source, url = site.url, "scraping source");

        let html = self.pages.fetch_page(site.url).await?;
        let candidates = extract_candidates(&html, site, self.max_candidates)?;
        debug!(source = %site.source, count = candidates.len(), "extracted candidates");

        for candidate in candidates {
            let Some(category) = classify(&candidate.title, "") else {
                continue;
            };

            let title_key = candidate.title.trim().to_lowercase();
            if !seen_titles.insert(title_key) {
                debug!(title = %candidate.title, "duplicate title within run");
                continue;
            }
            report.found += 1;

            let content = match &candidate.url {
                Some(url) => {
                    tokio::time::sleep(self.inter_request_delay).await;
                    match self.pages.fetch_page(url).await {
                        Ok(page) => extract_content(&page),
                        Err(e) => {
                            debug!(error = %e, url, "content fetch failed, storing title only");
                            None
                        }
                    }
                }
                None => None,
            };

            let article = NewArticle {
                title: clean_text(&candidate.title),
                content,
                url: candidate.url,
                source: site.source,
                category,
                published_date: candidate.date_text,
            };

            match self.repo.add_article(article).await {
                Ok(true) => {
                    report.saved += 1;
                    info!(source = %site.source, category = %category, "saved new article");
                }
                Ok(false) => debug!(source = %site.source, "article already stored"),
                // storage failure drops this candidate, not the run
                Err(e) => error!(error = %e, "failed to persist article"),
            }
        }

        Ok(())
    }
}

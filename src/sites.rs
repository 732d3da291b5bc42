use std::time::Duration;

use crate::models::Source;

/// CSS selectors for one portal's listing page. Each field is a
/// comma-separated list of alternatives, tried as a single selector group.
#[derive(Debug, Clone, Copy)]
pub struct SelectorSet {
    pub articles: &'static str,
    pub title: &'static str,
    pub link: &'static str,
    pub date: &'static str,
}

/// Static per-portal scraping configuration. Loaded once, immutable for
/// the lifetime of the process.
#[derive(Debug, Clone, Copy)]
pub struct SiteConfig {
    pub source: Source,
    pub url: &'static str,
    pub selectors: SelectorSet,
    pub rate_limit: Duration,
}

/// All supported portals, in the order they are scraped. The order is
/// fixed so that title collisions across sources resolve deterministically.
pub fn registry() -> Vec<SiteConfig> {
    vec![
        SiteConfig {
            source: Source::PrfNacional,
            url: "https://www.gov.br/prf/pt-br/noticias/ultimas/",
            selectors: SelectorSet {
                // PRF lists every story inside an h2
                articles: "h2",
                title: "h2 a",
                link: "h2 a",
                date: ".documentByLine, .summary-view-icon, .date",
            },
            rate_limit: Duration::from_secs(2),
        },
        SiteConfig {
            source: Source::PfNacional,
            url: "https://www.gov.br/pf/pt-br/assuntos/noticias/ultimas-noticias/",
            selectors: SelectorSet {
                articles: "article, .item, .noticia, .materia",
                title: "h3 a, h2 a, .titulo a, .materia-titulo a",
                link: "h3 a, h2 a, .titulo a, .materia-titulo a",
                date: ".data, .date, time, .materia-data",
            },
            rate_limit: Duration::from_secs(2),
        },
        SiteConfig {
            source: Source::Mprs,
            url: "https://www.mprs.mp.br/noticias/",
            selectors: SelectorSet {
                articles: "h2, a[href*=\"/noticias/\"]",
                title: "h2 a, a[href*=\"/noticias/\"]",
                link: "h2 a, a[href*=\"/noticias/\"]",
                date: ".data, .date, time, .materia-data, .publicado",
            },
            rate_limit: Duration::from_secs(2),
        },
        SiteConfig {
            source: Source::PoliciaCivilRs,
            url: "https://www.pc.rs.gov.br/noticias/",
            selectors: SelectorSet {
                articles: "h3, h4, .item, .noticia, article",
                title: "h3 a, h4 a, .titulo a, a",
                link: "h3 a, h4 a, .titulo a, a",
                date: ".data, .date, time, .timestamp",
            },
            rate_limit: Duration::from_secs(2),
        },
        SiteConfig {
            source: Source::BrigadaMilitar,
            url: "https://www.brigadamilitar.rs.gov.br/noticias/",
            selectors: SelectorSet {
                articles: "h3",
                title: "h3 a",
                link: "h3 a",
                date: ".data, .date, time, .timestamp, .news-date",
            },
            rate_limit: Duration::from_secs(3),
        },
        SiteConfig {
            source: Source::PmSc,
            url: "https://www.pm.sc.gov.br/noticias/",
            selectors: SelectorSet {
                // stories are plain links into /noticias/
                articles: "a[href*=\"/noticias/\"]",
                title: "a[href*=\"/noticias/\"]",
                link: "a[href*=\"/noticias/\"]",
                date: ".data, .date, time, .timestamp",
            },
            rate_limit: Duration::from_secs(2),
        },
        SiteConfig {
            source: Source::PmPr,
            url: "https://www.pmpr.pr.gov.br/Noticias/",
            selectors: SelectorSet {
                articles: "article, .item, .noticia, .materia",
                title: "h3 a, h2 a, .titulo a, .materia-titulo a",
                link: "h3 a, h2 a, .titulo a, .materia-titulo a",
                date: ".data, .date, time, .materia-data",
            },
            rate_limit: Duration::from_secs(2),
        },
        SiteConfig {
            source: Source::DofMs,
            url: "https://www.dof.ms.gov.br/noticias/",
            selectors: SelectorSet {
                articles: ".card, .card-body, .post",
                title: "h5.card-title a, h5.card-title, .card-title a",
                link: "h5.card-title a, .card-title a, a",
                date: ".card-text small, .date, time, .timestamp",
            },
            rate_limit: Duration::from_secs(2),
        },
        SiteConfig {
            source: Source::PcSc,
            url: "https://pc.sc.gov.br/noticias/",
            selectors: SelectorSet {
                articles: "h3, article",
                title: "h3 a, h3",
                link: "h3 a, h3",
                date: ".data, .date, time, .timestamp",
            },
            rate_limit: Duration::from_secs(2),
        },
        SiteConfig {
            source: Source::PcPr,
            url: "https://www.policiacivil.pr.gov.br/noticias/",
            selectors: SelectorSet {
                articles: "article, .item, h3, h4",
                title: "h3 a, h4 a, .titulo a",
                link: "h3 a, h4 a, .titulo a",
                date: "time, .date, .data, .timestamp",
            },
            rate_limit: Duration::from_secs(2),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_selectors_parse() {
        for site in registry() {
            for sel in [
                site.selectors.articles,
                site.selectors.title,
                site.selectors.link,
                site.selectors.date,
            ] {
                assert!(
                    scraper::Selector::parse(sel).is_ok(),
                    "bad selector for {}: {}",
                    site.source,
                    sel
                );
            }
        }
    }

    #[test]
    fn registry_order_is_stable() {
        let first: Vec<_> = registry().iter().map(|s| s.source).collect();
        let second: Vec<_> = registry().iter().map(|s| s.source).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
    }
}

//! Selector-driven candidate extraction.
//!
//! One generic routine handles every portal, parameterized by its
//! [`SiteConfig`] selector set. Listing pages are messy: the title
//! selector may match nothing, links may be relative or carry the
//! section segment twice, dates are frequently absent. Each lookup has
//! a fallback chain and absence of a date is not an error.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Candidate;
use crate::sites::SiteConfig;

/// Titles shorter than this after trimming are navigation noise.
const MIN_TITLE_CHARS: usize = 10;

/// Article body is capped to keep chat messages and rows small.
const MAX_CONTENT_CHARS: usize = 2000;

const CONTENT_SELECTORS: &[&str] = &[
    "article",
    ".article-content",
    ".news-content",
    ".content",
    ".post-content",
    "main",
];

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn anchor_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("a[href]").expect("valid selector"))
}

fn heading_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("h1, h2, h3, h4").expect("valid selector"))
}

/// Collapse whitespace runs and trim.
pub fn clean_text(text: &str) -> String {
    whitespace_re().replace_all(text, " ").trim().to_string()
}

fn parse_selector(input: &str) -> Result<Selector> {
    Selector::parse(input).map_err(|e| AppError::Selector(format!("{input}: {e}")))
}

fn element_text(el: ElementRef) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Extract listing candidates from a fetched page.
///
/// Containers come from the site's `articles` selector, falling back to
/// every anchor on the page when it matches nothing. Document order is
/// preserved and output is capped at `max_candidates`.
pub fn extract_candidates(
    html: &str,
    site: &SiteConfig,
    max_candidates: usize,
) -> Result<Vec<Candidate>> {
    let document = Html::parse_document(html);
    let base = Url::parse(site.url)
        .map_err(|e| AppError::Config(format!("bad base url {}: {e}", site.url)))?;

    let articles_sel = parse_selector(site.selectors.articles)?;
    let title_sel = parse_selector(site.selectors.title)?;
    let link_sel = parse_selector(site.selectors.link)?;
    let date_sel = parse_selector(site.selectors.date)?;

    let mut containers: Vec<ElementRef> = document.select(&articles_sel).collect();
    if containers.is_empty() {
        tracing::debug!(source = %site.source, "articles selector matched nothing, scanning all anchors");
        containers = document.select(anchor_selector()).collect();
    }

    let mut candidates = Vec::new();
    for container in containers {
        if candidates.len() >= max_candidates {
            break;
        }

        let Some(title) = resolve_title(container, &title_sel) else {
            continue;
        };

        let href = container
            .select(&link_sel)
            .next()
            .and_then(|el| el.value().attr("href"))
            .or_else(|| container.value().attr("href"));

        let url = match href {
            Some(href) => match resolve_link(&base, href) {
                Some(resolved) => Some(resolved.to_string()),
                // Off-host or junk link: not an article of this portal.
                None => continue,
            },
            None => None,
        };

        let date_text = container
            .select(&date_sel)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty());

        candidates.push(Candidate { title, url, date_text });
    }

    Ok(candidates)
}

/// Title lookup chain: title selector inside the container, the
/// container's own text, then a heading in a nearby ancestor block.
fn resolve_title(container: ElementRef, title_sel: &Selector) -> Option<String> {
    let from_selector = container.select(title_sel).next().map(element_text);

    let title = match from_selector {
        Some(t) if t.chars().count() >= MIN_TITLE_CHARS => t,
        _ => {
            let own = element_text(container);
            if own.chars().count() >= MIN_TITLE_CHARS {
                own
            } else {
                ancestor_heading(container)?
            }
        }
    };

    if title.chars().count() >= MIN_TITLE_CHARS {
        Some(title)
    } else {
        None
    }
}

/// Look for a heading inside the nearest ancestor block elements. Bare
/// anchors often sit next to their headline rather than around it.
fn ancestor_heading(el: ElementRef) -> Option<String> {
    for node in el.ancestors() {
        let Some(parent) = ElementRef::wrap(node) else {
            continue;
        };
        if !matches!(parent.value().name(), "div" | "article" | "section" | "li") {
            continue;
        }
        if let Some(heading) = parent.select(heading_selector()).next() {
            let text = element_text(heading);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Resolve `href` against the portal base URL.
///
/// Root-relative links are joined against the origin so a base of
/// `https://host/noticias/` plus `/noticias/123` yields a single
/// `/noticias` segment. Immediately repeated segments produced by
/// path-relative links are collapsed. Links leaving the portal's host
/// are rejected.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("mailto:") || lower.ends_with(".pdf")
    {
        return None;
    }

    let resolved = if lower.starts_with("http://") || lower.starts_with("https://") {
        Url::parse(href).ok()?
    } else {
        collapse_repeated_segment(base.join(href).ok()?)
    };

    if resolved.host_str() != base.host_str() {
        return None;
    }

    Some(resolved)
}

fn collapse_repeated_segment(mut url: Url) -> Url {
    let collapsed: Option<String> = url.path_segments().map(|segments| {
        let mut out: Vec<&str> = Vec::new();
        for seg in segments {
            if !seg.is_empty() && out.last() == Some(&seg) {
                continue;
            }
            out.push(seg);
        }
        out.join("/")
    });

    if let Some(path) = collapsed {
        url.set_path(&path);
    }
    url
}

/// Pull the article body out of a content page.
///
/// Tries the common content containers in order; when none matches,
/// falls back to a plain-text rendering of the whole page. Output is
/// whitespace-normalized and truncated to [`MAX_CONTENT_CHARS`].
pub fn extract_content(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let mut content = String::new();
    for selector in CONTENT_SELECTORS {
        let sel = Selector::parse(selector).expect("valid selector");
        if let Some(el) = document.select(&sel).next() {
            content = element_text(el);
            if !content.is_empty() {
                break;
            }
        }
    }

    if content.is_empty() {
        let text = html2text::from_read(html.as_bytes(), 80).ok()?;
        content = clean_text(&text);
    }

    if content.is_empty() {
        return None;
    }

    if content.chars().count() > MAX_CONTENT_CHARS {
        let mut truncated: String = content.chars().take(MAX_CONTENT_CHARS).collect();
        truncated.push_str("...");
        content = truncated;
    }

    Some(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;
    use crate::sites::SelectorSet;
    use std::time::Duration;

    fn test_site(articles: &'static str, title: &'static str, link: &'static str) -> SiteConfig {
        SiteConfig {
            source: Source::PoliciaCivilRs,
            url: "https://example.gov.br/noticias/",
            selectors: SelectorSet {
                articles,
                title,
                link,
                date: ".date",
            },
            rate_limit: Duration::from_secs(2),
        }
    }

    #[test]
    fn extracts_title_link_and_date() {
        let html = r#"
            <html><body>
              <article>
                <h3><a href="/noticias/123-operacao">Operação apreende drogas no sul</a></h3>
                <span class="date">12/08/2026</span>
              </article>
            </body></html>"#;
        let site = test_site("article", "h3 a", "h3 a");

        let got = extract_candidates(html, &site, 20).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "Operação apreende drogas no sul");
        assert_eq!(
            got[0].url.as_deref(),
            Some("https://example.gov.br/noticias/123-operacao")
        );
        assert_eq!(got[0].date_text.as_deref(), Some("12/08/2026"));
    }

    #[test]
    fn short_titles_are_dropped() {
        let html = r#"<article><h3><a href="/noticias/1">Notícias</a></h3></article>"#;
        let site = test_site("article", "h3 a", "h3 a");

        let got = extract_candidates(html, &site, 20).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn missing_date_is_not_an_error() {
        let html = r#"<article><h3><a href="/noticias/1">Polícia prende suspeitos em Canoas</a></h3></article>"#;
        let site = test_site("article", "h3 a", "h3 a");

        let got = extract_candidates(html, &site, 20).unwrap();
        assert_eq!(got.len(), 1);
        assert!(got[0].date_text.is_none());
    }

    #[test]
    fn falls_back_to_all_anchors_when_selector_matches_nothing() {
        let html = r#"
            <div class="lista">
              <a href="/noticias/9">Apreensão de armas em Pelotas nesta sexta</a>
            </div>"#;
        let site = test_site(".nao-existe", ".nao-existe a", ".nao-existe a");

        let got = extract_candidates(html, &site, 20).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "Apreensão de armas em Pelotas nesta sexta");
    }

    #[test]
    fn falls_back_to_ancestor_heading_for_bare_links() {
        let html = r#"
            <div class="noticia">
              <h2>Operação desmantela grupo criminoso na capital</h2>
              <a href="/noticias/55">Leia</a>
            </div>"#;
        let site = test_site("a[href]", "span.titulo", "a[href]");

        let got = extract_candidates(html, &site, 20).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "Operação desmantela grupo criminoso na capital");
        assert_eq!(got[0].url.as_deref(), Some("https://example.gov.br/noticias/55"));
    }

    #[test]
    fn candidates_are_capped_per_page() {
        let mut html = String::from("<ul>");
        for i in 0..30 {
            html.push_str(&format!(
                r#"<li><a href="/noticias/{i}">Notícia relevante número {i} da lista</a></li>"#
            ));
        }
        html.push_str("</ul>");
        let site = test_site("li", "a", "a");

        let got = extract_candidates(&html, &site, 20).unwrap();
        assert_eq!(got.len(), 20);
        assert!(got[0].title.contains("número 0"));
    }

    #[test]
    fn off_host_links_are_rejected() {
        let html = r#"<article><h3><a href="https://outro-site.com/x">Operação apreende drogas no norte</a></h3></article>"#;
        let site = test_site("article", "h3 a", "h3 a");

        let got = extract_candidates(html, &site, 20).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn root_relative_link_does_not_duplicate_section_segment() {
        let base = Url::parse("https://example.gov.br/noticias/").unwrap();
        let got = resolve_link(&base, "/noticias/123-titulo").unwrap();
        assert_eq!(got.as_str(), "https://example.gov.br/noticias/123-titulo");
    }

    #[test]
    fn path_relative_link_does_not_duplicate_section_segment() {
        let base = Url::parse("https://example.gov.br/noticias/").unwrap();
        let got = resolve_link(&base, "noticias/123-titulo").unwrap();
        assert_eq!(got.as_str(), "https://example.gov.br/noticias/123-titulo");
    }

    #[test]
    fn junk_links_are_rejected() {
        let base = Url::parse("https://example.gov.br/noticias/").unwrap();
        assert!(resolve_link(&base, "javascript:void(0)").is_none());
        assert!(resolve_link(&base, "mailto:imprensa@example.gov.br").is_none());
        assert!(resolve_link(&base, "#conteudo").is_none());
        assert!(resolve_link(&base, "/arquivos/boletim.pdf").is_none());
    }

    #[test]
    fn content_prefers_article_container() {
        let html = r#"
            <html><body>
              <nav>Menu institucional</nav>
              <article>A PRF apreendeu 500kg de maconha na BR-290 durante fiscalização.</article>
            </body></html>"#;
        let got = extract_content(html).unwrap();
        assert!(got.starts_with("A PRF apreendeu 500kg"));
        assert!(!got.contains("Menu institucional"));
    }

    #[test]
    fn content_falls_back_to_page_text() {
        let html = "<html><body><p>Texto solto da notícia sem container específico.</p></body></html>";
        let got = extract_content(html).unwrap();
        assert!(got.contains("Texto solto da notícia"));
    }

    #[test]
    fn content_is_truncated_with_ellipsis() {
        let body = "palavra ".repeat(600);
        let html = format!("<article>{body}</article>");
        let got = extract_content(&html).unwrap();
        assert!(got.ends_with("..."));
        assert_eq!(got.chars().count(), MAX_CONTENT_CHARS + 3);
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Operação \n\t conjunta  "), "Operação conjunta");
    }
}

//! Keyword relevance filter.
//!
//! Plain substring matching over the case-folded title+content text. The
//! first matching group in priority order decides the category; matching
//! inside longer unrelated words is a known precision limitation.

use crate::models::Category;

const INVESTIGACAO_TERMS: &[&str] = &["gaeco", "lavagem", "investigação"];

const DROGAS_TERMS: &[&str] = &[
    "drogas",
    "maconha",
    "cocaína",
    "ecstasy",
    "skunk",
    "bunker",
    "entorpecentes",
    "narcóticos",
];

const ARMAS_TERMS: &[&str] = &["armas"];

const TRAFICO_TERMS: &[&str] = &["tráfico", "facção", "grupo criminoso"];

const POLICIAL_TERMS: &[&str] = &["apreensão", "prisão", "operação", "desmantela"];

/// Relevant terms that belong to no specific group.
const GERAL_TERMS: &[&str] = &["contas abertas", "substâncias ilícitas"];

/// Priority order is fixed: a title mentioning both drugs and a generic
/// police action is categorized by the drug term.
const GROUPS: &[(&[&str], Category)] = &[
    (INVESTIGACAO_TERMS, Category::Investigacao),
    (DROGAS_TERMS, Category::Drogas),
    (ARMAS_TERMS, Category::Armas),
    (TRAFICO_TERMS, Category::Trafico),
    (POLICIAL_TERMS, Category::Policial),
    (GERAL_TERMS, Category::Geral),
];

/// Decide whether an article is about the crime/security topics we track.
///
/// Returns the matched category, or `None` when the article is irrelevant.
pub fn classify(title: &str, content: &str) -> Option<Category> {
    let haystack = format!("{} {}", title, content).to_lowercase();

    for (terms, category) in GROUPS {
        if terms.iter().any(|term| haystack.contains(term)) {
            return Some(*category);
        }
    }

    None
}

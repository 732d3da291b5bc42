use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of monitored portals. Display names double as the
/// canonical `source` value in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    PrfNacional,
    PfNacional,
    Mprs,
    PoliciaCivilRs,
    BrigadaMilitar,
    PmSc,
    PmPr,
    DofMs,
    PcSc,
    PcPr,
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Source::PrfNacional => "PRF Nacional",
            Source::PfNacional => "PF Nacional",
            Source::Mprs => "MPRS",
            Source::PoliciaCivilRs => "Polícia Civil",
            Source::BrigadaMilitar => "Brigada Militar",
            Source::PmSc => "PM SC",
            Source::PmPr => "PM PR",
            Source::DofMs => "DOF MS",
            Source::PcSc => "PC SC",
            Source::PcPr => "PC PR",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse topic assigned by the keyword classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Investigacao,
    Drogas,
    Armas,
    Trafico,
    Policial,
    Geral,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Investigacao => "investigação",
            Category::Drogas => "drogas",
            Category::Armas => "armas",
            Category::Trafico => "tráfico",
            Category::Policial => "policial",
            Category::Geral => "geral",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "investigação" => Some(Category::Investigacao),
            "drogas" => Some(Category::Drogas),
            "armas" => Some(Category::Armas),
            "tráfico" => Some(Category::Trafico),
            "policial" => Some(Category::Policial),
            "geral" => Some(Category::Geral),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An extracted but not yet validated listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    /// Absolute URL, already resolved against the site base. `None` when
    /// the listing carried no usable link.
    pub url: Option<String>,
    /// Raw date text as scraped. Not parsed; consumers display it as-is.
    pub date_text: Option<String>,
}

/// A stored article, read back from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub url: Option<String>,
    pub source: String,
    pub category: Category,
    pub location: Option<String>,
    pub published_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_to_telegram: bool,
    pub viewed: bool,
}

/// A candidate that survived classification and is ready for insertion.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content: Option<String>,
    pub url: Option<String>,
    pub source: Source,
    pub category: Category,
    pub published_date: Option<String>,
}

/// Query shapes exposed to the chat layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsFilter {
    All,
    Unviewed,
    Viewed,
    Unsent,
    Sent,
    Category(Category),
    Source(Source),
}

/// Aggregate counters, computed on demand.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub total: i64,
    /// (category, count), highest count first.
    pub per_category: Vec<(String, i64)>,
    /// (source, count), highest count first.
    pub per_source: Vec<(String, i64)>,
    pub unviewed: i64,
    pub unsent: i64,
}

#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub activity: String,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A chat user registered for notifications. Owned by the distribution
/// layer; the store only keeps the registry.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub user_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
}

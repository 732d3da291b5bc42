use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Retry budget exhausted for a source page. Recoverable: the caller
    /// skips the source for the current run.
    #[error("fetch failed after {attempts} attempts: {url}")]
    FetchExhausted { url: String, attempts: u32 },

    #[error("invalid CSS selector: {0}")]
    Selector(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

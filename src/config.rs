use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Timeout for each HTTP request (listing and content pages).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_base")]
    pub backoff_base_secs: u64,

    /// Pause between content fetches for candidates of the same source.
    #[serde(default = "default_inter_request_delay")]
    pub inter_request_delay_ms: u64,

    #[serde(default = "default_max_candidates")]
    pub max_candidates_per_page: usize,

    /// Hard ceiling on the time spent on a single source per cycle.
    #[serde(default = "default_source_ceiling")]
    pub per_source_time_ceiling_secs: u64,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sentinela");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("news.db").to_string_lossy().to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    2
}

fn default_inter_request_delay() -> u64 {
    500
}

fn default_max_candidates() -> usize {
    20
}

fn default_source_ceiling() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base(),
            inter_request_delay_ms: default_inter_request_delay(),
            max_candidates_per_page: default_max_candidates(),
            per_source_time_ceiling_secs: default_source_ceiling(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sentinela")
            .join("config.toml")
    }
}

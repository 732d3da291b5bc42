use std::time::Duration;

use sentinela::config::Config;
use sentinela::db::Repository;
use sentinela::error::Result;
use sentinela::fetch::{PageFetcher, RetryPolicy};
use sentinela::pipeline::Pipeline;
use sentinela::sites;

/// Headless entry point: run one ingestion cycle and exit. Scheduling is
/// external (cron or the bot's own timer).
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    let repository = Repository::new(&config.db_path).await?;

    let retry = RetryPolicy {
        max_attempts: config.max_retries,
        base_delay: Duration::from_secs(config.backoff_base_secs),
    };
    let fetcher = PageFetcher::new(Duration::from_secs(config.request_timeout_secs), retry);

    let pipeline = Pipeline::new(fetcher, &repository, sites::registry(), &config);
    let report = pipeline.run_ingestion_cycle().await?;

    println!("Found {} relevant articles, saved {}", report.found, report.saved);
    Ok(())
}

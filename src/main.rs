//! Release feed watcher — binary entrypoint.
//! Seeds the seen-set from the current feed, then polls forever and forwards security
//! digests to Slack (or stdout when no webhook is configured).

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cve_feed_notifier::ingest::feed::FeedProvider;
use cve_feed_notifier::ingest::page::HttpPageFetcher;
use cve_feed_notifier::metrics::{ensure_metrics_described, install_exporter};
use cve_feed_notifier::notify::notifier_for;
use cve_feed_notifier::relevance::RelevanceRule;
use cve_feed_notifier::{Config, Monitor, Pipeline};

/// Compact logs by default; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cve_feed_notifier=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::load()?;
    match cfg.metrics_addr.as_deref() {
        Some(addr) => install_exporter(addr)?,
        None => ensure_metrics_described(),
    }

    tracing::info!(
        feed = %cfg.feed_url,
        interval_secs = cfg.poll_interval_secs,
        webhook = cfg.webhook_url.is_some(),
        "starting release feed watcher"
    );

    let feed = FeedProvider::from_url(cfg.feed_url.clone(), cfg.http_timeout());
    let fetcher = Arc::new(HttpPageFetcher::new(cfg.http_timeout()));
    let pipeline = Pipeline::standard(RelevanceRule::new(cfg.required_tags.clone()), fetcher);
    let notifier = notifier_for(
        cfg.webhook_url.as_deref(),
        cfg.http_timeout_secs,
        cfg.webhook_retries,
    );

    Monitor::new(Box::new(feed), pipeline, notifier, cfg.poll_interval())
        .with_max_page_attempts(cfg.max_page_attempts)
        .run()
        .await;

    Ok(())
}

//! Sends a sample security digest through the configured notifier (stdout when no
//! SLACK_WEBHOOK_URL is set). Handy for checking webhook wiring.

use chrono::Utc;
use cve_feed_notifier::extract::{ExtractionResult, SecurityRecord, Severity};
use cve_feed_notifier::format::format_payload;
use cve_feed_notifier::notify::notifier_for;
use cve_feed_notifier::{Config, FeedEntry};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = Config::load()?;
    let notifier = notifier_for(
        cfg.webhook_url.as_deref(),
        cfg.http_timeout_secs,
        cfg.webhook_retries,
    );

    let entry = FeedEntry::new("https://example.com/stable-channel-update-for-desktop.html")
        .with_tags(["Desktop Update", "Stable updates"])
        .with_published(Utc::now());
    let extraction = ExtractionResult::Records(vec![
        SecurityRecord::full(Severity::High, "CVE-0000-0001", "demo heap overflow"),
        SecurityRecord::pair(Severity::Medium, "CVE-0000-0002"),
    ]);

    if let Some(payload) = format_payload(&entry, &extraction, Utc::now()) {
        notifier.send(&payload).await?;
    }

    println!("notify-demo done via {}", notifier.name());
    Ok(())
}

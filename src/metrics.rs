// src/metrics.rs
use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_entries_total", "Entries parsed from the release feed.");
        describe_counter!("feed_fetch_errors_total", "Feed fetch/parse failures.");
        describe_counter!(
            "entries_irrelevant_total",
            "New entries without the required tag pair."
        );
        describe_counter!(
            "extraction_fallback_total",
            "Times the chain moved past its first strategy."
        );
        describe_counter!("page_fetch_errors_total", "Post page fetch failures.");
        describe_counter!(
            "entries_deferred_total",
            "Entries postponed to the next cycle after a page fetch failure."
        );
        describe_counter!("notifications_sent_total", "Payloads accepted by the sink.");
        describe_counter!(
            "notifications_failed_total",
            "Payloads the sink rejected (echoed to stdout instead)."
        );
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("seen_set_size", "URLs in the in-memory seen-set.");
        describe_gauge!("poll_last_run_ts", "Unix ts of the last completed poll cycle.");
    });
}

/// Install the Prometheus recorder with an HTTP listener on `addr`.
/// Must be called from inside a tokio runtime.
pub fn install_exporter(addr: &str) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid metrics address {addr:?}"))?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("prometheus: install exporter")?;
    ensure_metrics_described();
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}

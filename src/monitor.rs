// src/monitor.rs
//! Poll loop: seed the seen-set from the current feed, then poll forever.
//!
//! The seen-set lives only in memory. After a restart it is re-seeded from whatever the
//! feed shows at that moment, so a post that appeared while the process was down is
//! treated as already seen and never announced.

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, gauge};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::ingest::oldest_first;
use crate::ingest::types::FeedSource;
use crate::notify::{ConsoleNotifier, Notifier, SlackPayload};
use crate::pipeline::{Outcome, Pipeline};

/// Post URLs handled during this process lifetime. Only grows.
#[derive(Debug, Default, Clone)]
pub struct SeenSet {
    urls: HashSet<String>,
}

impl SeenSet {
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Returns true if the URL was not seen before.
    pub fn insert(&mut self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seeding,
    Polling,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    pub fetched: usize,
    pub new: usize,
    pub irrelevant: usize,
    pub suppressed: usize,
    pub deferred: usize,
    pub notified: usize,
}

pub struct Monitor {
    feed: Box<dyn FeedSource>,
    pipeline: Pipeline,
    notifier: Box<dyn Notifier>,
    seen: SeenSet,
    phase: Phase,
    page_attempts: HashMap<String, u32>,
    max_page_attempts: u32,
    interval: Duration,
}

impl Monitor {
    pub fn new(
        feed: Box<dyn FeedSource>,
        pipeline: Pipeline,
        notifier: Box<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        Self {
            feed,
            pipeline,
            notifier,
            seen: SeenSet::default(),
            phase: Phase::Seeding,
            page_attempts: HashMap::new(),
            max_page_attempts: 3,
            interval,
        }
    }

    pub fn with_max_page_attempts(mut self, n: u32) -> Self {
        self.max_page_attempts = n.max(1);
        self
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Entries waiting for another page fetch attempt.
    pub fn pending_retries(&self) -> usize {
        self.page_attempts.len()
    }

    /// Record every URL currently in the feed without extracting anything.
    pub async fn seed(&mut self) -> Result<usize> {
        let entries = self
            .feed
            .fetch_entries()
            .await
            .with_context(|| format!("seeding from {}", self.feed.name()))?;
        for e in &entries {
            self.seen.insert(&e.link);
        }
        self.phase = Phase::Polling;
        gauge!("seen_set_size").set(self.seen.len() as f64);
        tracing::info!(seeded = entries.len(), "seen-set seeded from current feed");
        Ok(entries.len())
    }

    /// One polling cycle. A feed fetch error is returned untouched; the seen-set is kept.
    pub async fn poll_once(&mut self) -> Result<PollReport> {
        let entries = match self.feed.fetch_entries().await {
            Ok(v) => v,
            Err(e) => {
                counter!("feed_fetch_errors_total").increment(1);
                return Err(e).with_context(|| format!("polling {}", self.feed.name()));
            }
        };

        let current: HashSet<String> = entries.iter().map(|e| e.link.clone()).collect();
        let mut report = PollReport {
            fetched: entries.len(),
            ..PollReport::default()
        };

        for entry in oldest_first(entries) {
            if self.seen.contains(&entry.link) {
                continue;
            }
            report.new += 1;

            let attempts = self.page_attempts.get(&entry.link).copied().unwrap_or(0) + 1;
            let allow_defer = attempts < self.max_page_attempts;

            match self.pipeline.process(&entry, allow_defer, Utc::now()).await {
                Outcome::Deferred => {
                    counter!("entries_deferred_total").increment(1);
                    tracing::warn!(url = %entry.link, attempts, "page unavailable, retrying next cycle");
                    self.page_attempts.insert(entry.link.clone(), attempts);
                    report.deferred += 1;
                    continue;
                }
                Outcome::Irrelevant => report.irrelevant += 1,
                Outcome::Suppressed => report.suppressed += 1,
                Outcome::Notify(payload) => {
                    self.deliver(&entry.link, &payload).await;
                    report.notified += 1;
                }
            }

            self.page_attempts.remove(&entry.link);
            self.seen.insert(&entry.link);
        }

        // Retries only matter while the entry is still in the feed.
        self.page_attempts.retain(|link, _| current.contains(link));

        gauge!("seen_set_size").set(self.seen.len() as f64);
        gauge!("poll_last_run_ts").set(Utc::now().timestamp() as f64);
        Ok(report)
    }

    async fn deliver(&self, url: &str, payload: &SlackPayload) {
        match self.notifier.send(payload).await {
            Ok(()) => {
                counter!("notifications_sent_total").increment(1);
                tracing::info!(url, notifier = self.notifier.name(), "notification sent");
            }
            Err(e) => {
                counter!("notifications_failed_total").increment(1);
                tracing::error!(url, notifier = self.notifier.name(), error = %format!("{e:#}"), "delivery failed, echoing to stdout");
                if let Err(e) = ConsoleNotifier.send(payload).await {
                    tracing::error!(error = %format!("{e:#}"), "console echo failed");
                }
            }
        }
    }

    /// One step of the state machine: seed if still seeding, otherwise poll.
    pub async fn step(&mut self) {
        match self.phase {
            Phase::Seeding => {
                if let Err(e) = self.seed().await {
                    counter!("feed_fetch_errors_total").increment(1);
                    tracing::warn!(error = %format!("{e:#}"), "seeding failed, retrying after interval");
                    return;
                }
                self.poll_and_log().await;
            }
            Phase::Polling => self.poll_and_log().await,
        }
    }

    async fn poll_and_log(&mut self) {
        match self.poll_once().await {
            Ok(r) => tracing::info!(
                fetched = r.fetched,
                new = r.new,
                notified = r.notified,
                suppressed = r.suppressed,
                irrelevant = r.irrelevant,
                deferred = r.deferred,
                "poll cycle done"
            ),
            Err(e) => tracing::warn!(error = %format!("{e:#}"), "poll cycle failed, keeping seen-set"),
        }
    }

    /// Runs until the process is stopped.
    pub async fn run(mut self) {
        loop {
            self.step().await;
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seen_set_grows_and_reports_new() {
        let mut s = SeenSet::default();
        assert!(s.is_empty());
        assert!(s.insert("https://a"));
        assert!(!s.insert("https://a"));
        assert!(s.contains("https://a"));
        assert!(!s.contains("https://b"));
        assert_eq!(s.len(), 1);
    }
}

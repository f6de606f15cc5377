// src/pipeline.rs
//! Per-entry pipeline: relevance gate → extraction chain → formatter.

use chrono::{DateTime, Utc};
use metrics::counter;
use std::sync::Arc;

use crate::extract::page::PageExtractor;
use crate::extract::summary::SummaryExtractor;
use crate::extract::{ExtractionResult, ExtractorChain};
use crate::format::format_payload;
use crate::ingest::types::{FeedEntry, PageFetcher};
use crate::notify::SlackPayload;
use crate::relevance::RelevanceRule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Tags did not qualify; nothing was fetched.
    Irrelevant,
    /// Relevant post with no security content at all.
    Suppressed,
    /// Page fetch failed and the summary alone gave nothing structured; retry later.
    Deferred,
    Notify(SlackPayload),
}

pub struct Pipeline {
    rule: RelevanceRule,
    chain: ExtractorChain,
}

impl Pipeline {
    pub fn new(rule: RelevanceRule, chain: ExtractorChain) -> Self {
        Self { rule, chain }
    }

    /// Page-first, summary-fallback chain.
    pub fn standard(rule: RelevanceRule, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::new(
            rule,
            ExtractorChain::new(vec![
                Box::new(PageExtractor::new(fetcher)),
                Box::new(SummaryExtractor),
            ]),
        )
    }

    /// Run one entry. With `allow_defer` false a degraded result is accepted even when the
    /// page could not be fetched.
    pub async fn process(
        &self,
        entry: &FeedEntry,
        allow_defer: bool,
        now: DateTime<Utc>,
    ) -> Outcome {
        if !self.rule.is_relevant(&entry.tags) {
            counter!("entries_irrelevant_total").increment(1);
            tracing::debug!(url = %entry.link, "not a stable desktop update");
            return Outcome::Irrelevant;
        }

        let extraction = self.chain.run(entry).await;
        let structured = matches!(extraction.result, ExtractionResult::Records(_));
        if extraction.fetch_failed && !structured && allow_defer {
            return Outcome::Deferred;
        }

        match format_payload(entry, &extraction.result, now) {
            Some(payload) => Outcome::Notify(payload),
            None => {
                tracing::info!(url = %entry.link, "no security content, suppressed");
                Outcome::Suppressed
            }
        }
    }
}

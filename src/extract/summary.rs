// src/extract/summary.rs
//! Fallback strategy: scan the feed-supplied HTML summary.
//! Two pattern families seen in past posts, tried in order.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{ExtractError, Extractor, SecurityRecord};
use crate::ingest::collapse_whitespace;
use crate::ingest::types::FeedEntry;

// <span ..>High</span><span ..> CVE-2024-1234</span>
static RE_PAIRED_SPANS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)<span.*?> ?(Critical|High|Medium|Low) ?.*?</span><span.*?>.{0,5}(CVE.*?) ?</span>",
    )
    .unwrap()
});

// ...1234</a>] High CVE-2024-1234: Use after free in Foo.
static RE_BRACKET_TERMINATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)>\] ?(Critical|High|Medium|Low) ?.*?.{0,5}(CVE.*?) ?\.").unwrap()
});

fn clean_identifier(raw: &str) -> String {
    collapse_whitespace(&html_escape::decode_html_entities(raw))
}

fn scan(re: &Regex, html: &str) -> Vec<SecurityRecord> {
    re.captures_iter(html)
        .map(|caps| {
            let identifier = caps.get(2).map(|m| clean_identifier(m.as_str()));
            SecurityRecord::from_parts(
                caps.get(1).map(|m| m.as_str()),
                identifier.as_deref(),
                None,
            )
        })
        .collect()
}

/// Parse (severity, identifier) pairs out of summary HTML. First family with matches wins.
pub fn parse_summary(html: &str) -> Vec<SecurityRecord> {
    let paired = scan(&RE_PAIRED_SPANS, html);
    if !paired.is_empty() {
        return paired;
    }
    scan(&RE_BRACKET_TERMINATED, html)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryExtractor;

#[async_trait]
impl Extractor for SummaryExtractor {
    async fn extract(&self, entry: &FeedEntry) -> Result<Vec<SecurityRecord>, ExtractError> {
        Ok(parse_summary(&entry.summary_html))
    }

    fn name(&self) -> &'static str {
        "summary"
    }
}

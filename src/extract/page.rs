// src/extract/page.rs
//! Primary strategy: fetch the rendered post and scan its body text.
//! The rendered page tends to carry cleaner text than the feed's HTML summary.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;

use super::{ExtractError, Extractor, SecurityRecord};
use crate::ingest::collapse_whitespace;
use crate::ingest::types::{FeedEntry, PageFetcher};

/// CSS selector of the post body on the upstream blog.
pub const CONTENT_SELECTOR: &str = "div.post-body";

static CONTENT: Lazy<Selector> = Lazy::new(|| Selector::parse(CONTENT_SELECTOR).unwrap());

// "<severity> CVE-YYYY-NNNN: <text>." with the severity word matched case-insensitively.
static RE_CVE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?i:critical|high|medium|low)) ?(CVE-\d+-\d+): ([^.]*)\.").unwrap()
});

/// Parse security records out of a rendered page. Order follows the document.
pub fn parse_page(html: &str) -> Result<Vec<SecurityRecord>, ExtractError> {
    let document = Html::parse_document(html);
    let section = document
        .select(&CONTENT)
        .next()
        .ok_or(ExtractError::MissingContent(CONTENT_SELECTOR))?;
    let text: String = section.text().collect();

    Ok(RE_CVE_LINE
        .captures_iter(&text)
        .map(|caps| {
            let description = caps.get(3).map(|m| collapse_whitespace(m.as_str()));
            SecurityRecord::from_parts(
                caps.get(1).map(|m| m.as_str()),
                caps.get(2).map(|m| m.as_str()),
                description.as_deref(),
            )
        })
        .collect())
}

pub struct PageExtractor {
    fetcher: Arc<dyn PageFetcher>,
}

impl PageExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Extractor for PageExtractor {
    async fn extract(&self, entry: &FeedEntry) -> Result<Vec<SecurityRecord>, ExtractError> {
        let body = self
            .fetcher
            .fetch_page(&entry.link)
            .await
            .map_err(ExtractError::Fetch)?;
        parse_page(&body)
    }

    fn name(&self) -> &'static str {
        "page"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Severity;

    #[test]
    fn extracts_full_triples_in_document_order() {
        let html = r#"<html><body><div class="post-body">
            <p>[$7000][1501] High CVE-2024-0001: Heap overflow in V8. Reported by A.</p>
            <p>[N/A][1502] critical CVE-2024-0002: Use after
               free in ANGLE. Reported by B.</p>
        </div></body></html>"#;
        let recs = parse_page(html).unwrap();
        assert_eq!(
            recs,
            vec![
                SecurityRecord::full(Severity::High, "CVE-2024-0001", "Heap overflow in V8"),
                SecurityRecord::full(
                    Severity::Critical,
                    "CVE-2024-0002",
                    "Use after free in ANGLE"
                ),
            ]
        );
    }

    #[test]
    fn text_outside_post_body_is_ignored() {
        let html = r#"<div class="sidebar">High CVE-2024-1111: elsewhere.</div>
            <div class="post post-body"><p>No fixes here.</p></div>"#;
        assert!(parse_page(html).unwrap().is_empty());
    }

    #[test]
    fn missing_marker_is_a_structural_miss() {
        let err = parse_page("<html><body><p>High CVE-2024-1: x.</p></body></html>")
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingContent(_)));
    }

    #[test]
    fn severity_word_must_start_a_word() {
        let html = r#"<div class="post-body">Details below CVE-2024-1: not a fix. Low CVE-2024-2: real.</div>"#;
        assert_eq!(
            parse_page(html).unwrap(),
            vec![SecurityRecord::full(Severity::Low, "CVE-2024-2", "real")]
        );
    }

    #[test]
    fn empty_description_yields_pair() {
        let html = r#"<div class="post-body">Medium CVE-2024-0003: .</div>"#;
        assert_eq!(
            parse_page(html).unwrap(),
            vec![SecurityRecord::pair(Severity::Medium, "CVE-2024-0003")]
        );
    }
}

// src/extract/mod.rs
//! Security-content extraction: record types, the strategy seam, and the chain that
//! composes the page-based and summary-based strategies.

pub mod page;
pub mod summary;

use async_trait::async_trait;
use metrics::counter;
use std::fmt;

use crate::ingest::types::FeedEntry;

/// Severity word as published upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Case-insensitive parse of the four upstream severity words.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed finding. The variant records how much of the triple was recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityRecord {
    Full {
        severity: Severity,
        identifier: String,
        description: String,
    },
    Pair {
        severity: Severity,
        identifier: String,
    },
    /// Only one usable field; severity unknown.
    Unclassified { text: String },
    /// Nothing usable. Kept so the formatter can surface extractor regressions.
    Malformed { raw: String },
}

impl SecurityRecord {
    pub fn full(severity: Severity, identifier: &str, description: &str) -> Self {
        Self::Full {
            severity,
            identifier: identifier.to_string(),
            description: description.to_string(),
        }
    }

    pub fn pair(severity: Severity, identifier: &str) -> Self {
        Self::Pair {
            severity,
            identifier: identifier.to_string(),
        }
    }

    /// Build from raw captures. Fields are trimmed; empty ones count as absent.
    pub fn from_parts(
        severity: Option<&str>,
        identifier: Option<&str>,
        description: Option<&str>,
    ) -> Self {
        fn clean(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }
        let sev = severity.and_then(Severity::parse);
        let id = clean(identifier);
        let desc = clean(description);

        match (sev, id, desc) {
            (Some(s), Some(i), Some(d)) => Self::full(s, i, d),
            (Some(s), Some(i), None) => Self::pair(s, i),
            (None, Some(t), None) | (None, None, Some(t)) | (Some(_), None, Some(t)) => {
                Self::Unclassified {
                    text: t.to_string(),
                }
            }
            (None, Some(i), Some(d)) => Self::Unclassified {
                text: format!("{i}: {d}"),
            },
            _ => Self::Malformed {
                raw: format!("{severity:?} / {identifier:?} / {description:?}"),
            },
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            Self::Full { severity, .. } | Self::Pair { severity, .. } => Some(*severity),
            _ => None,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Full { identifier, .. } | Self::Pair { identifier, .. } => Some(identifier),
            _ => None,
        }
    }
}

/// Result of running the whole extraction chain for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    /// Non-empty, in order of appearance in the source text.
    Records(Vec<SecurityRecord>),
    /// The word "security" appears but no pattern matched.
    KeywordOnly,
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The page was fetched but its main content region is missing.
    #[error("main content region `{0}` not found in page")]
    MissingContent(&'static str),
    /// The page could not be fetched at all.
    #[error("page fetch failed: {0:#}")]
    Fetch(anyhow::Error),
}

/// One extraction strategy. An empty `Ok` means "nothing here, try the next one".
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, entry: &FeedEntry) -> Result<Vec<SecurityRecord>, ExtractError>;
    fn name(&self) -> &'static str;
}

/// Output of the chain plus whether any strategy hit a transport fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub result: ExtractionResult,
    pub strategy: Option<&'static str>,
    pub fetch_failed: bool,
}

/// Tries strategies in order; first non-empty record list wins.
pub struct ExtractorChain {
    strategies: Vec<Box<dyn Extractor>>,
}

impl ExtractorChain {
    pub fn new(strategies: Vec<Box<dyn Extractor>>) -> Self {
        Self { strategies }
    }

    pub async fn run(&self, entry: &FeedEntry) -> Extraction {
        let mut fetch_failed = false;

        for (i, strategy) in self.strategies.iter().enumerate() {
            if i > 0 {
                counter!("extraction_fallback_total").increment(1);
            }
            match strategy.extract(entry).await {
                Ok(records) if !records.is_empty() => {
                    tracing::debug!(
                        url = %entry.link,
                        strategy = strategy.name(),
                        count = records.len(),
                        "security records extracted"
                    );
                    return Extraction {
                        result: ExtractionResult::Records(records),
                        strategy: Some(strategy.name()),
                        fetch_failed,
                    };
                }
                Ok(_) => {
                    tracing::debug!(url = %entry.link, strategy = strategy.name(), "no match");
                }
                Err(e @ ExtractError::MissingContent(_)) => {
                    tracing::info!(url = %entry.link, strategy = strategy.name(), error = %e, "structural miss, falling back");
                }
                Err(e @ ExtractError::Fetch(_)) => {
                    fetch_failed = true;
                    counter!("page_fetch_errors_total").increment(1);
                    tracing::warn!(url = %entry.link, strategy = strategy.name(), error = %e, "falling back");
                }
            }
        }

        let result = if contains_security_keyword(&entry.summary_html) {
            ExtractionResult::KeywordOnly
        } else {
            ExtractionResult::NotFound
        };
        Extraction {
            result,
            strategy: None,
            fetch_failed,
        }
    }
}

pub fn contains_security_keyword(text: &str) -> bool {
    text.to_lowercase().contains("security")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Vec<SecurityRecord>, &'static str>, &'static str);

    #[async_trait]
    impl Extractor for Fixed {
        async fn extract(&self, _e: &FeedEntry) -> Result<Vec<SecurityRecord>, ExtractError> {
            match &self.0 {
                Ok(v) => Ok(v.clone()),
                Err("missing") => Err(ExtractError::MissingContent("div.post-body")),
                Err(msg) => Err(ExtractError::Fetch(anyhow::anyhow!(*msg))),
            }
        }
        fn name(&self) -> &'static str {
            self.1
        }
    }

    #[test]
    fn severity_parse_is_case_insensitive() {
        assert_eq!(Severity::parse("HIGH"), Some(Severity::High));
        assert_eq!(Severity::parse(" critical "), Some(Severity::Critical));
        assert_eq!(Severity::parse("urgent"), None);
        assert_eq!(Severity::Medium.to_string(), "Medium");
    }

    #[test]
    fn from_parts_picks_variant_by_available_fields() {
        assert_eq!(
            SecurityRecord::from_parts(Some("high"), Some("CVE-1"), Some(" boom ")),
            SecurityRecord::full(Severity::High, "CVE-1", "boom")
        );
        assert_eq!(
            SecurityRecord::from_parts(Some("Low"), Some("CVE-2"), Some("  ")),
            SecurityRecord::pair(Severity::Low, "CVE-2")
        );
        assert_eq!(
            SecurityRecord::from_parts(None, None, Some("text only")),
            SecurityRecord::Unclassified {
                text: "text only".into()
            }
        );
        assert!(matches!(
            SecurityRecord::from_parts(Some("High"), None, None),
            SecurityRecord::Malformed { .. }
        ));
    }

    #[tokio::test]
    async fn chain_falls_back_and_flags_fetch_failure() {
        let chain = ExtractorChain::new(vec![
            Box::new(Fixed(Err("boom"), "page")),
            Box::new(Fixed(
                Ok(vec![SecurityRecord::pair(Severity::Critical, "CVE-9")]),
                "summary",
            )),
        ]);
        let out = chain.run(&FeedEntry::new("https://x")).await;
        assert!(out.fetch_failed);
        assert_eq!(out.strategy, Some("summary"));
        assert!(matches!(out.result, ExtractionResult::Records(ref v) if v.len() == 1));
    }

    #[tokio::test]
    async fn chain_degrades_to_keyword_then_not_found() {
        let chain = ExtractorChain::new(vec![
            Box::new(Fixed(Err("missing"), "page")),
            Box::new(Fixed(Ok(vec![]), "summary")),
        ]);
        let with_kw = FeedEntry::new("https://x").with_summary("Includes SECURITY fixes");
        let out = chain.run(&with_kw).await;
        assert_eq!(out.result, ExtractionResult::KeywordOnly);
        assert!(!out.fetch_failed);

        let without = FeedEntry::new("https://x").with_summary("Bug fixes only");
        assert_eq!(chain.run(&without).await.result, ExtractionResult::NotFound);
    }
}

// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// One post as supplied by the release feed. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub link: String,
    pub tags: BTreeSet<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub summary_html: String,
}

impl FeedEntry {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            tags: BTreeSet::new(),
            published_at: None,
            summary_html: String::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_published(mut self, ts: DateTime<Utc>) -> Self {
        self.published_at = Some(ts);
        self
    }

    pub fn with_summary(mut self, html: impl Into<String>) -> Self {
        self.summary_html = html.into();
        self
    }
}

/// Feed reader collaborator. Entries come back in feed order (newest first upstream).
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>>;
    fn name(&self) -> &'static str;
}

/// Page fetch collaborator: raw response text of a post URL.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

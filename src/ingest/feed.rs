// src/ingest/feed.rs
//! Release feed reader: Atom (the upstream Blogger/Feedburner format) and RSS 2.0.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::events::Event;
use quick_xml::{de::from_str, Reader};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::types::{FeedEntry, FeedSource};

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    #[serde(rename = "feedburner:origLink")]
    orig_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    link: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<RssCategory>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RssCategory {
    #[serde(rename = "$text", default)]
    value: String,
}

fn to_utc(dt: OffsetDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.unix_timestamp(), 0)
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc3339).ok().and_then(to_utc)
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822).ok().and_then(to_utc)
}

/// Name of the document's root element, without namespace prefix.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn clean_tags<I: IntoIterator<Item = String>>(items: I) -> BTreeSet<String> {
    items
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .collect()
}

impl AtomEntry {
    fn into_feed_entry(self) -> Option<FeedEntry> {
        let alternate = self
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .and_then(|l| l.href.clone());
        let any_href = self.links.iter().find_map(|l| l.href.clone());
        let link = alternate.or(any_href).or(self.orig_link)?;

        let published_at = self
            .published
            .as_deref()
            .or(self.updated.as_deref())
            .and_then(parse_rfc3339);

        let summary_html = self
            .summary
            .filter(|s| !s.value.trim().is_empty())
            .or(self.content)
            .map(|t| t.value)
            .unwrap_or_default();

        Some(FeedEntry {
            link: link.trim().to_string(),
            tags: clean_tags(self.categories.into_iter().filter_map(|c| c.term)),
            published_at,
            summary_html,
        })
    }
}

impl RssItem {
    fn into_feed_entry(self) -> Option<FeedEntry> {
        let link = self.link?.trim().to_string();
        if link.is_empty() {
            return None;
        }
        Some(FeedEntry {
            link,
            tags: clean_tags(self.categories.into_iter().map(|c| c.value)),
            published_at: self.pub_date.as_deref().and_then(parse_rfc2822),
            summary_html: self.description.unwrap_or_default(),
        })
    }
}

/// Parse an Atom or RSS document into entries, preserving document order.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let raw: Vec<Option<FeedEntry>> = match root_element(&xml_clean).as_deref() {
        Some("feed") => {
            let feed: AtomFeed = from_str(&xml_clean).context("parsing atom feed xml")?;
            feed.entries
                .into_iter()
                .map(AtomEntry::into_feed_entry)
                .collect()
        }
        Some("rss") => {
            let rss: Rss = from_str(&xml_clean).context("parsing rss feed xml")?;
            rss.channel
                .items
                .into_iter()
                .map(RssItem::into_feed_entry)
                .collect()
        }
        Some(other) => return Err(anyhow!("unsupported feed root element <{other}>")),
        None => return Err(anyhow!("feed document has no root element")),
    };

    let total = raw.len();
    let out: Vec<FeedEntry> = raw.into_iter().flatten().collect();
    if out.len() < total {
        tracing::debug!(dropped = total - out.len(), "feed entries without a link");
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    counter!("feed_entries_total").increment(out.len() as u64);
    Ok(out)
}

pub struct FeedProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
        timeout: Duration,
    },
}

impl FeedProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
                timeout,
            },
        }
    }
}

#[async_trait]
impl FeedSource for FeedProvider {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>> {
        match &self.mode {
            Mode::Fixture(s) => parse_feed(s),
            Mode::Http {
                url,
                client,
                timeout,
            } => {
                let body = client
                    .get(url.as_str())
                    .timeout(*timeout)
                    .send()
                    .await
                    .context("feed http get()")?
                    .error_for_status()
                    .context("feed non-2xx")?
                    .text()
                    .await
                    .context("feed http .text()")?;
                parse_feed(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "release-feed"
    }
}

// Bare HTML entities are not valid XML; some RSS producers leave them unescaped.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

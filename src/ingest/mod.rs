// src/ingest/mod.rs
pub mod feed;
pub mod page;
pub mod types;

use crate::ingest::types::FeedEntry;
use once_cell::sync::OnceCell;
use regex::Regex;

/// Collapse runs of whitespace (including newlines from rendered HTML) and trim.
pub fn collapse_whitespace(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(s, " ").trim().to_string()
}

/// Upstream feeds list newest first; notifications go out oldest first.
pub fn oldest_first(mut entries: Vec<FeedEntry>) -> Vec<FeedEntry> {
    entries.reverse();
    entries
}

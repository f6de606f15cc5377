// src/format.rs
//! Turns an extraction result into a Slack payload.

use chrono::{DateTime, Utc};

use crate::extract::{ExtractionResult, SecurityRecord};
use crate::ingest::types::FeedEntry;
use crate::notify::{Attachment, Field, SlackPayload};

pub const BULLET: &str = " \u{2022}   ";
pub const MAX_MESSAGE_CHARS: usize = 4000;
pub const TRUNCATION_PLACEHOLDER: &str = "[...truncated...]";
pub const ALERT_COLOR: &str = "#D00000";
pub const FIELD_TITLE: &str = "Security Issues";
pub const KEYWORD_ONLY_LINE: &str =
    "Article contained the word 'security' but no CVEs detected. Someone should double-check..";

/// `*[DD/MM/YY HH:MM:SS]*: URL: <link>` plus newline.
pub fn header_line(link: &str, ts: DateTime<Utc>) -> String {
    format!("*{}*: URL: {}\n", ts.format("[%d/%m/%y %H:%M:%S]"), link)
}

/// One bullet line per record, newline-terminated.
pub fn record_line(record: &SecurityRecord) -> String {
    let body = match record {
        SecurityRecord::Full {
            severity,
            identifier,
            description,
        } => format!("[{severity}]: {identifier}: {description}"),
        SecurityRecord::Pair {
            severity,
            identifier,
        } => format!("[{severity}]: {identifier}"),
        SecurityRecord::Unclassified { text } => format!("[????]: {text}"),
        SecurityRecord::Malformed { raw } => {
            tracing::error!(record = %raw, "extractor produced a record with no usable fields");
            "Something went really wrong: a record had no usable fields! Check the logs..".to_string()
        }
    };
    format!("{BULLET}{body}\n")
}

/// Bullet-line body, or `None` when the post should be suppressed.
pub fn issues_body(extraction: &ExtractionResult) -> Option<String> {
    match extraction {
        ExtractionResult::Records(records) if !records.is_empty() => {
            Some(records.iter().map(record_line).collect())
        }
        ExtractionResult::Records(_) | ExtractionResult::NotFound => None,
        ExtractionResult::KeywordOnly => Some(format!("{BULLET}{KEYWORD_ONLY_LINE}\n")),
    }
}

/// Build the payload for `entry`. `now` stands in for a missing publish time.
pub fn format_payload(
    entry: &FeedEntry,
    extraction: &ExtractionResult,
    now: DateTime<Utc>,
) -> Option<SlackPayload> {
    let issues = issues_body(extraction)?;
    let header = header_line(&entry.link, entry.published_at.unwrap_or(now));

    Some(SlackPayload {
        attachments: vec![Attachment {
            fallback: truncate_message(&format!("{header}{issues}"), MAX_MESSAGE_CHARS),
            pretext: header,
            color: ALERT_COLOR.to_string(),
            fields: vec![Field {
                title: FIELD_TITLE.to_string(),
                value: truncate_message(&issues, MAX_MESSAGE_CHARS),
                short: false,
            }],
        }],
    })
}

/// Shrink `message` to at most `limit` characters.
///
/// Each pass replaces every occurrence of the longest whitespace-delimited token (first one
/// on ties) with [`TRUNCATION_PLACEHOLDER`]. This is lossy and depends on token order; it
/// is not a precise cut. When no token is longer than the placeholder, the text is cut at
/// `limit` characters instead.
pub fn truncate_message(message: &str, limit: usize) -> String {
    let mut out = message.to_string();
    while out.chars().count() > limit {
        let longest = out
            .split_whitespace()
            .reduce(|best, t| {
                if t.chars().count() > best.chars().count() {
                    t
                } else {
                    best
                }
            })
            .map(str::to_string);

        match longest {
            Some(word) if word.chars().count() > TRUNCATION_PLACEHOLDER.chars().count() => {
                out = out.replace(&word, TRUNCATION_PLACEHOLDER);
            }
            _ => {
                out = out.chars().take(limit).collect();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Severity;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 16, 20, 34, 5).unwrap()
    }

    #[test]
    fn header_uses_day_month_short_year() {
        assert_eq!(
            header_line("https://x/post", ts()),
            "*[16/01/24 20:34:05]*: URL: https://x/post\n"
        );
    }

    #[test]
    fn record_lines_by_variant() {
        let full = SecurityRecord::full(Severity::High, "CVE-2024-0001", "heap overflow");
        assert_eq!(record_line(&full), format!("{BULLET}[High]: CVE-2024-0001: heap overflow\n"));
        let pair = SecurityRecord::pair(Severity::Critical, "CVE-2024-9999");
        assert_eq!(record_line(&pair), format!("{BULLET}[Critical]: CVE-2024-9999\n"));
        let one = SecurityRecord::Unclassified { text: "odd".into() };
        assert_eq!(record_line(&one), format!("{BULLET}[????]: odd\n"));
        let bad = SecurityRecord::Malformed { raw: "None".into() };
        assert!(record_line(&bad).contains("Something went really wrong"));
    }

    #[test]
    fn not_found_is_suppressed() {
        let e = FeedEntry::new("https://x");
        assert!(format_payload(&e, &ExtractionResult::NotFound, ts()).is_none());
        assert!(format_payload(&e, &ExtractionResult::Records(vec![]), ts()).is_none());
    }

    #[test]
    fn keyword_only_gets_advisory_line() {
        let e = FeedEntry::new("https://x").with_published(ts());
        let p = format_payload(&e, &ExtractionResult::KeywordOnly, ts()).unwrap();
        let a = &p.attachments[0];
        assert_eq!(a.fields[0].value.lines().count(), 1);
        assert!(a.fields[0].value.contains(KEYWORD_ONLY_LINE));
        assert_eq!(a.pretext, "*[16/01/24 20:34:05]*: URL: https://x\n");
        assert_eq!(a.fallback, format!("{}{}", a.pretext, a.fields[0].value));
    }

    #[test]
    fn truncate_leaves_short_messages_alone() {
        assert_eq!(truncate_message("a b c", 10), "a b c");
    }

    #[test]
    fn truncate_replaces_first_longest_token() {
        let msg = format!("{} {} tail", "x".repeat(30), "y".repeat(30));
        let out = truncate_message(&msg, 60);
        assert_eq!(out, format!("{TRUNCATION_PLACEHOLDER} {} tail", "y".repeat(30)));
    }

    #[test]
    fn truncate_terminates_on_short_tokens() {
        let msg = "ab ".repeat(3000);
        let out = truncate_message(&msg, MAX_MESSAGE_CHARS);
        assert_eq!(out.chars().count(), MAX_MESSAGE_CHARS);
    }
}

// src/notify/mod.rs
pub mod console;
pub mod slack;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use console::ConsoleNotifier;
pub use slack::SlackNotifier;

/// Slack incoming-webhook body with a single attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackPayload {
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub fallback: String,
    pub pretext: String,
    pub color: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    pub short: bool,
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, payload: &SlackPayload) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Webhook when configured, console otherwise.
pub fn notifier_for(
    webhook_url: Option<&str>,
    timeout_secs: u64,
    retries: u8,
) -> Box<dyn Notifier> {
    match webhook_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => Box::new(
            SlackNotifier::new(url.to_string())
                .with_timeout(timeout_secs)
                .with_retries(retries),
        ),
        None => {
            tracing::info!("no SLACK_WEBHOOK_URL configured, notifications go to stdout");
            Box::new(ConsoleNotifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_webhook_selects_console() {
        assert_eq!(notifier_for(None, 5, 1).name(), "console");
        assert_eq!(notifier_for(Some("  "), 5, 1).name(), "console");
        assert_eq!(
            notifier_for(Some("https://hooks.slack.com/services/x"), 5, 1).name(),
            "slack"
        );
    }

    #[test]
    fn payload_serializes_in_webhook_shape() {
        let p = SlackPayload {
            attachments: vec![Attachment {
                fallback: "f".into(),
                pretext: "p".into(),
                color: "#D00000".into(),
                fields: vec![Field {
                    title: "Security Issues".into(),
                    value: "v".into(),
                    short: false,
                }],
            }],
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["attachments"][0]["color"], "#D00000");
        assert_eq!(v["attachments"][0]["fields"][0]["title"], "Security Issues");
        assert_eq!(v["attachments"][0]["fields"][0]["short"], false);
    }
}

use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;

use super::{Notifier, SlackPayload};

/// Delay before the next attempt: 500ms doubled per failure, capped at 32s.
fn backoff(attempt: u8) -> Duration {
    let exp = u32::from(attempt.saturating_sub(1)).min(6);
    Duration::from_millis(500u64 << exp)
}

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl SlackNotifier {
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, payload: &SlackPayload) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook_url)
                .timeout(self.timeout)
                .json(payload)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status_ref() {
                    Ok(_) => return Ok(()),
                    Err(e) => anyhow!("slack webhook HTTP error: {e}"),
                },
                Err(e) => anyhow!("slack webhook request failed: {e}"),
            };

            if attempt >= self.max_retries {
                return Err(err);
            }
            tracing::debug!(attempt, error = %err, "slack post failed, retrying");
            tokio::time::sleep(backoff(attempt)).await;
        }
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}

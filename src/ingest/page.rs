// src/ingest/page.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::ingest::types::PageFetcher;

/// Fetches the rendered post page over HTTP.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("page get {url}"))?
            .error_for_status()
            .context("page non-2xx")?;
        resp.text().await.context("page .text()")
    }
}

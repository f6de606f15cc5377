// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::relevance::{DESKTOP_UPDATE_TAG, STABLE_CHANNEL_TAG};

pub const DEFAULT_FEED_URL: &str = "http://feeds.feedburner.com/GoogleChromeReleases";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_CONFIG_PATH: &str = "config/notifier.toml";

pub const ENV_CONFIG_PATH: &str = "NOTIFIER_CONFIG_PATH";
pub const ENV_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";
pub const ENV_FEED_URL: &str = "FEED_URL";
pub const ENV_POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
pub const ENV_WEBHOOK_RETRIES: &str = "WEBHOOK_RETRIES";
pub const ENV_MAX_PAGE_ATTEMPTS: &str = "MAX_PAGE_ATTEMPTS";
pub const ENV_METRICS_ADDR: &str = "METRICS_ADDR";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `None` → console-only mode.
    pub webhook_url: Option<String>,
    pub feed_url: String,
    pub poll_interval_secs: u64,
    pub required_tags: Vec<String>,
    pub http_timeout_secs: u64,
    pub webhook_retries: u8,
    pub max_page_attempts: u32,
    pub metrics_addr: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: None,
            feed_url: DEFAULT_FEED_URL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            required_tags: vec![DESKTOP_UPDATE_TAG.into(), STABLE_CHANNEL_TAG.into()],
            http_timeout_secs: 10,
            webhook_retries: 3,
            max_page_attempts: 3,
            metrics_addr: None,
        }
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Parse a TOML config file. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: Config = toml::from_str(s).context("parsing notifier config toml")?;
        cfg.webhook_url = non_blank(cfg.webhook_url);
        cfg.metrics_addr = non_blank(cfg.metrics_addr);
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolve config:
    /// 1) $NOTIFIER_CONFIG_PATH (must exist)
    /// 2) config/notifier.toml if present
    /// 3) defaults
    ///
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };
        base.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(v) = std::env::var(ENV_WEBHOOK_URL) {
            // An explicitly empty value switches to console mode.
            self.webhook_url = non_blank(Some(v));
        }
        if let Ok(v) = std::env::var(ENV_FEED_URL) {
            if !v.trim().is_empty() {
                self.feed_url = v.trim().to_string();
            }
        }
        if let Some(v) = env_parse(ENV_POLL_INTERVAL_SECS)? {
            self.poll_interval_secs = v;
        }
        if let Some(v) = env_parse(ENV_HTTP_TIMEOUT_SECS)? {
            self.http_timeout_secs = v;
        }
        if let Some(v) = env_parse(ENV_WEBHOOK_RETRIES)? {
            self.webhook_retries = v;
        }
        if let Some(v) = env_parse(ENV_MAX_PAGE_ATTEMPTS)? {
            self.max_page_attempts = v;
        }
        if let Ok(v) = std::env::var(ENV_METRICS_ADDR) {
            self.metrics_addr = non_blank(Some(v));
        }
        Ok(self)
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{key} has invalid value {v:?}")),
        _ => Ok(None),
    }
}

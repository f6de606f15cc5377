// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod extract;
pub mod format;
pub mod ingest;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod pipeline;
pub mod relevance;

// ---- Re-exports for stable public API ----
pub use crate::config::Config;
pub use crate::extract::{ExtractionResult, SecurityRecord, Severity};
pub use crate::ingest::types::FeedEntry;
pub use crate::monitor::{Monitor, PollReport, SeenSet};
pub use crate::notify::{Notifier, SlackPayload};
pub use crate::pipeline::{Outcome, Pipeline};

use anyhow::{Context, Result};
use std::io::Write;

use super::{Notifier, SlackPayload};

/// Writes the payload to stdout. Offline mode, and the echo of last resort when the
/// webhook is unreachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

#[async_trait::async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, payload: &SlackPayload) -> Result<()> {
        let json = serde_json::to_string_pretty(payload).context("serialize payload")?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{json}").context("write payload to stdout")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

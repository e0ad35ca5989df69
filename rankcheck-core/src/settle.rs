//! Settle window after finishing a competition.
//!
//! The platform may aggregate rankings and billing asynchronously after a
//! finish. The oracle waits a fixed worst-case lag once and then expects the
//! final state; it never polls until consistent.

use std::time::Duration;

use crate::context::RunContext;
use crate::error::CheckError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleWindow {
    duration: Duration,
}

impl SettleWindow {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Sleep for the full window unless the run is cancelled first.
    pub async fn wait(&self, ctx: &RunContext) -> Result<(), CheckError> {
        tracing::debug!(settle_ms = self.duration.as_millis() as u64, "waiting for settle window");
        ctx.run_until_cancelled(tokio::time::sleep(self.duration))
            .await
            .ok_or(CheckError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_waits_full_window() {
        let window = SettleWindow::new(Duration::from_secs(1));
        let start = Instant::now();
        window.wait(&RunContext::detached()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_during_window() {
        let window = SettleWindow::new(Duration::from_secs(10));
        let ctx = RunContext::detached().with_deadline(Instant::now() + Duration::from_millis(100));
        let err = window.wait(&ctx).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}

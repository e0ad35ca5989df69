//! Run context: cancellation signal plus optional deadline.

use std::future::Future;

use tokio::sync::watch;
use tokio::time::Instant;

/// Cancels every run holding a context cloned from the paired [`RunContext`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace never fails, even with no receivers left.
        self.tx.send_replace(true);
    }
}

/// Per-run execution context. Cheap to clone; clones observe the same signal.
#[derive(Debug, Clone)]
pub struct RunContext {
    cancel_rx: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

impl RunContext {
    pub fn new() -> (CancelHandle, Self) {
        let (tx, cancel_rx) = watch::channel(false);
        (
            CancelHandle { tx },
            Self {
                cancel_rx,
                deadline: None,
            },
        )
    }

    /// A context that is never cancelled.
    pub fn detached() -> Self {
        Self::new().1
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the run is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel_rx.clone();
        let signal = async move {
            // A dropped handle can never cancel.
            if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = signal => {}
            _ = deadline => {}
        }
    }

    /// Drive `fut` to completion unless the run is cancelled first.
    pub async fn run_until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

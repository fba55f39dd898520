use std::{
    future::IntoFuture,
    time::{Duration, Instant},
};

/// The overall deadline of a wait. Every call made while waiting is bounded by what is left of it.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    /// Returns the deadline `timeout` from now.
    pub(crate) fn after(timeout: Duration) -> Self {
        Self { at: Instant::now() + timeout, timeout }
    }

    /// Returns the timeout the deadline was created with.
    pub(crate) const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns true once the deadline passed.
    pub(crate) fn passed(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Runs `call`, returning [`None`] if the deadline passes first.
    pub(crate) async fn run<F: IntoFuture>(&self, call: F) -> Option<F::Output> {
        tokio::time::timeout(self.at.saturating_duration_since(Instant::now()), call).await.ok()
    }

    /// Sleeps for `duration`, waking up early at the deadline.
    pub(crate) async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration.min(self.at.saturating_duration_since(Instant::now()))).await
    }
}

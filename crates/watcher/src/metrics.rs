use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// The metrics of the waiters.
#[derive(Metrics, Clone)]
#[metrics(scope = "devnet_watcher")]
pub struct WatcherMetrics {
    /// A counter on the reorgs seen while waiting for confirmations.
    pub reorgs: Counter,
    /// A histogram of the time spent waiting for confirmations.
    pub confirmation_duration: Histogram,
    /// A counter on the waits that ran out of time.
    pub timeouts: Counter,
}

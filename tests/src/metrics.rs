use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// The metrics of the test runner.
#[derive(Metrics, Clone)]
#[metrics(scope = "devnet_runner")]
pub struct RunnerMetrics {
    /// A counter on the passed tests.
    pub passed: Counter,
    /// A counter on the failed tests.
    pub failed: Counter,
    /// A histogram of the test durations, setup included.
    pub test_duration: Histogram,
}

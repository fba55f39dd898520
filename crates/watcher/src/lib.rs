//! Liveness and confirmation waiters of the devnet harness.
//!
//! Every waiter polls until its condition holds or an overall deadline passes. RPC errors while a
//! node is still starting are expected and retried by [`wait_up`]. The other waiters surface them.

mod confirmations;
pub use confirmations::{
    wait_for_confirmations, ConfirmationOpts, ProviderReceiptSource, ReceiptFingerprint,
    ReceiptSource,
};

mod deadline;

mod error;
pub use error::{SyncDivergence, WaitError};

mod liveness;
pub use liveness::{wait_block, wait_receipt, wait_rollup_up, wait_up, POLL_INTERVAL};

mod metrics;
pub use metrics::WatcherMetrics;

mod sync;
pub use sync::{wait_synced, SyncMonitor};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

//! Test runner and scenarios of the devnet harness.
//!
//! Every test runs against a devnet of its own, created by a [`DevnetFactory`] and prepared by the
//! setup of its [`TestSpec`]. The scenarios cover the startup of a sequencer devnet, P2P sync
//! between a sequencer and its replicas, deposits while the sequencer is down, L1 reorgs driven
//! through the Engine API, and withdrawals from L2 back to L1.

mod clients;
pub use clients::{clients_from_env, DEFAULT_CLIENTS};

mod metrics;
pub use metrics::RunnerMetrics;

mod runner;
pub use runner::{
    run_tests, DevnetFactory, TestEnv, TestOutcome, TestReport, TestSpec, Transport,
};

pub mod scenarios;

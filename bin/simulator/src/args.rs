use clap::{Parser, ValueEnum};
use devnet_node::ClientDefinition;
use std::path::PathBuf;
use ::tests::TestSpec;

/// Runs test suites against OP-stack devnets in docker.
#[derive(Debug, Parser)]
#[command(name = "devnet-simulator")]
pub struct SimulatorArgs {
    /// The suite to run.
    #[arg(long, env = "DEVNET_SUITE", value_enum, default_value_t = Suite::All)]
    pub suite: Suite,
    /// How many tests run at the same time, each with a devnet of its own.
    #[arg(long, env = "DEVNET_CONCURRENCY", default_value_t = 16)]
    pub concurrency: usize,
    /// A client to run, as `name=image:role[,role]`. The first client of each role is used.
    /// Defaults to the hive images of geth and the OP-stack clients.
    #[arg(long = "client", env = "DEVNET_CLIENTS", value_delimiter = ';')]
    pub clients: Vec<ClientDefinition>,
    /// The directory holding `l1-allocs.json`, `l2-allocs.json` and `addresses.json`.
    #[arg(long, env = "DEVNET_ARTIFACTS")]
    pub artifacts: Option<PathBuf>,
    /// The log filter, used when `RUST_LOG` is not set.
    #[arg(long, env = "DEVNET_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
    /// The docker binary.
    #[arg(long, env = "DEVNET_DOCKER", default_value = "docker")]
    pub docker: String,
}

/// A group of tests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Suite {
    /// Sequencer devnet startup.
    Smoke,
    /// Replica sync over P2P.
    P2p,
    /// Deposits during a sequencer outage.
    Failures,
    /// L1 reorgs through the Engine API.
    Reorg,
    /// Withdrawals from L2 back to L1.
    Withdrawal,
    /// Every suite.
    All,
}

impl Suite {
    /// Returns the tests of the suite.
    pub fn tests(self) -> Vec<TestSpec> {
        use ::tests::scenarios;
        match self {
            Self::Smoke => scenarios::smoke(),
            Self::P2p => scenarios::p2p(),
            Self::Failures => scenarios::failures(),
            Self::Reorg => scenarios::reorg(),
            Self::Withdrawal => scenarios::withdrawal(),
            Self::All => scenarios::all(),
        }
    }
}

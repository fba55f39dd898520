use alloy_genesis::Genesis;
use alloy_primitives::Address;
use devnet_node::StartOptions;
use devnet_primitives::constants::{
    JWT_SECRET_PATH, OP_NODE_P2P_PORT, P2P_PRIV_KEY_PATH, ROLLUP_CONFIG_PATH, ROLLUP_RPC_PORT,
};
use std::time::Duration;
use url::Url;

/// Settings of the batch submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatcherConfig {
    /// The target size of a batch transaction.
    pub target_l1_tx_size_bytes: u64,
    /// The maximum size of a batch transaction.
    pub max_l1_tx_size_bytes: u64,
    /// The number of L1 blocks kept between submission and the sequencing window end.
    pub sub_safety_margin: u64,
    /// The interval the batcher polls the L2 chain at.
    pub poll_interval: Duration,
    /// The confirmations a batch transaction needs.
    pub num_confirmations: u64,
    /// The nonce-too-low errors after which a submission is abandoned.
    pub safe_abort_nonce_too_low_count: u64,
    /// The time after which a submission is retried with a higher fee.
    pub resubmission_timeout: Duration,
    /// The log level.
    pub log_level: String,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            target_l1_tx_size_bytes: 624,
            max_l1_tx_size_bytes: 120_000,
            sub_safety_margin: 4,
            poll_interval: Duration::from_secs(1),
            num_confirmations: 1,
            safe_abort_nonce_too_low_count: 3,
            resubmission_timeout: Duration::from_secs(30),
            log_level: "debug".to_string(),
        }
    }
}

/// Settings of the output proposer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposerConfig {
    /// The interval the proposer polls the rollup node at.
    pub poll_interval: Duration,
    /// The confirmations an output transaction needs.
    pub num_confirmations: u64,
    /// The nonce-too-low errors after which a submission is abandoned.
    pub safe_abort_nonce_too_low_count: u64,
    /// The time after which a submission is retried with a higher fee.
    pub resubmission_timeout: Duration,
    /// Whether outputs of non-finalized L2 blocks are proposed.
    pub allow_non_finalized: bool,
    /// The log level.
    pub log_level: String,
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            num_confirmations: 1,
            safe_abort_nonce_too_low_count: 3,
            resubmission_timeout: Duration::from_secs(30),
            allow_non_finalized: true,
            log_level: "debug".to_string(),
        }
    }
}

/// Formats a duration the way the node flags parse it.
fn flag_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Returns the options exposing the chain config of `genesis` to an L1 client, since the client
/// entrypoint configures forks from the environment rather than the genesis file.
pub(crate) fn eth1_options(genesis: &Genesis) -> StartOptions {
    let config = &genesis.config;
    let mut options = StartOptions::default()
        .with_env("HIVE_CHAIN_ID", config.chain_id)
        .with_env("HIVE_NETWORK_ID", config.chain_id);

    let forks = [
        ("HIVE_FORK_HOMESTEAD", config.homestead_block),
        ("HIVE_FORK_TANGERINE", config.eip150_block),
        ("HIVE_FORK_SPURIOUS", config.eip158_block),
        ("HIVE_FORK_BYZANTIUM", config.byzantium_block),
        ("HIVE_FORK_CONSTANTINOPLE", config.constantinople_block),
        ("HIVE_FORK_PETERSBURG", config.petersburg_block),
        ("HIVE_FORK_ISTANBUL", config.istanbul_block),
        ("HIVE_FORK_BERLIN", config.berlin_block),
        ("HIVE_FORK_LONDON", config.london_block),
    ];
    for (key, block) in forks {
        if let Some(block) = block {
            options = options.with_env(key, block);
        }
    }
    if let Some(period) = config.clique.as_ref().and_then(|clique| clique.period) {
        options = options.with_env("HIVE_CLIQUE_PERIOD", period);
    }
    options
}

/// Returns the options of a rollup node following `l1` and driving the engine at `l2_engine`.
pub(crate) fn op_node_options(l1: &Url, l2_engine: &Url, sequencer: bool) -> StartOptions {
    StartOptions::default()
        .with_env("OP_NODE_L1_ETH_RPC", l1)
        .with_env("OP_NODE_L2_ENGINE_RPC", l2_engine)
        .with_env("OP_NODE_ROLLUP_CONFIG", ROLLUP_CONFIG_PATH)
        .with_env("OP_NODE_RPC_ADDR", "0.0.0.0")
        .with_env("OP_NODE_RPC_PORT", ROLLUP_RPC_PORT)
        .with_env("OP_NODE_L1_TRUST_RPC", false)
        .with_env("OP_NODE_L2_ENGINE_AUTH", JWT_SECRET_PATH)
        .with_env("OP_NODE_LOG_LEVEL", "debug")
        .with_env("OP_NODE_SEQUENCER_ENABLED", sequencer)
        .with_env("OP_NODE_SEQUENCER_L1_CONFS", 0)
        .with_env("OP_NODE_VERIFIER_L1_CONFS", 0)
        .with_env("OP_NODE_P2P_PRIV_PATH", P2P_PRIV_KEY_PATH)
        .with_env("OP_NODE_P2P_ADVERTISE_TCP", OP_NODE_P2P_PORT)
        .with_env("OP_NODE_P2P_LISTEN_TCP_PORT", OP_NODE_P2P_PORT)
}

/// Returns the options of the output proposer.
pub(crate) fn proposer_options(
    config: &ProposerConfig,
    l1: &Url,
    rollup: &Url,
    l2_output_oracle: Address,
    mnemonic: &str,
    hd_path: &str,
) -> StartOptions {
    StartOptions::default()
        .with_env("OP_PROPOSER_L1_ETH_RPC", l1)
        .with_env("OP_PROPOSER_ROLLUP_RPC", rollup)
        .with_env("OP_PROPOSER_L2OO_ADDRESS", l2_output_oracle)
        .with_env("OP_PROPOSER_POLL_INTERVAL", flag_duration(config.poll_interval))
        .with_env("OP_PROPOSER_NUM_CONFIRMATIONS", config.num_confirmations)
        .with_env("OP_PROPOSER_SAFE_ABORT_NONCE_TOO_LOW_COUNT", config.safe_abort_nonce_too_low_count)
        .with_env("OP_PROPOSER_RESUBMISSION_TIMEOUT", flag_duration(config.resubmission_timeout))
        .with_env("OP_PROPOSER_MNEMONIC", mnemonic)
        .with_env("OP_PROPOSER_L2_OUTPUT_HD_PATH", hd_path)
        .with_env("OP_PROPOSER_ALLOW_NON_FINALIZED", config.allow_non_finalized)
        .with_env("OP_PROPOSER_LOG_LEVEL", &config.log_level)
}

/// Returns the options of the batch submitter.
pub(crate) fn batcher_options(
    config: &BatcherConfig,
    l1: &Url,
    l2: &Url,
    rollup: &Url,
    mnemonic: &str,
    hd_path: &str,
) -> StartOptions {
    StartOptions::default()
        .with_env("OP_BATCHER_L1_ETH_RPC", l1)
        .with_env("OP_BATCHER_L2_ETH_RPC", l2)
        .with_env("OP_BATCHER_ROLLUP_RPC", rollup)
        .with_env("OP_BATCHER_TARGET_L1_TX_SIZE_BYTES", config.target_l1_tx_size_bytes)
        .with_env("OP_BATCHER_MAX_L1_TX_SIZE_BYTES", config.max_l1_tx_size_bytes)
        .with_env("OP_BATCHER_SUB_SAFETY_MARGIN", config.sub_safety_margin)
        .with_env("OP_BATCHER_POLL_INTERVAL", flag_duration(config.poll_interval))
        .with_env("OP_BATCHER_NUM_CONFIRMATIONS", config.num_confirmations)
        .with_env("OP_BATCHER_SAFE_ABORT_NONCE_TOO_LOW_COUNT", config.safe_abort_nonce_too_low_count)
        .with_env("OP_BATCHER_RESUBMISSION_TIMEOUT", flag_duration(config.resubmission_timeout))
        .with_env("OP_BATCHER_MNEMONIC", mnemonic)
        .with_env("OP_BATCHER_SEQUENCER_HD_PATH", hd_path)
        .with_env("OP_BATCHER_LOG_LEVEL", &config.log_level)
}

/// Merges `overrides` into `options`. Entries of `overrides` win.
pub(crate) fn merge(mut options: StartOptions, overrides: StartOptions) -> StartOptions {
    options.env.extend(overrides.env);
    options.files.extend(overrides.files);
    options
}

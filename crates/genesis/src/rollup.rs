use crate::{genesis_hash, DeployConfig, Deployments, GenesisError};
use alloy_genesis::Genesis;
use alloy_primitives::{Address, B256, U256};
use devnet_primitives::BlockInfo;
use serde::{Deserialize, Serialize};

/// The L1 system config values the rollup starts with.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    /// The batch sender address.
    pub batcher_addr: Address,
    /// The L1 fee overhead, as a 32 byte word.
    pub overhead: B256,
    /// The L1 fee scalar, as a 32 byte word.
    pub scalar: B256,
    /// The L2 block gas limit.
    pub gas_limit: u64,
}

/// The genesis anchors of the rollup.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupGenesis {
    /// The L1 block the rollup starts deriving from.
    pub l1: BlockInfo,
    /// The L2 genesis block.
    pub l2: BlockInfo,
    /// The timestamp of the L2 genesis block.
    pub l2_time: u64,
    /// The initial system config.
    pub system_config: SystemConfig,
}

/// The rollup config, serialized the way rollup nodes read it from disk.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupConfig {
    /// The genesis anchors.
    pub genesis: RollupGenesis,
    /// The L2 block time, in seconds.
    pub block_time: u64,
    /// Maximum drift of L2 time over its L1 origin, in seconds.
    pub max_sequencer_drift: u64,
    /// The sequencing window, in L1 blocks.
    pub seq_window_size: u64,
    /// The channel timeout, in L1 blocks.
    pub channel_timeout: u64,
    /// The L1 chain id.
    pub l1_chain_id: u64,
    /// The L2 chain id.
    pub l2_chain_id: u64,
    /// Activation time of the regolith upgrade.
    pub regolith_time: Option<u64>,
    /// The batch inbox address.
    pub batch_inbox_address: Address,
    /// The deposit contract, which is the portal proxy.
    pub deposit_contract_address: Address,
    /// The L1 system config contract.
    pub l1_system_config_address: Address,
}

impl RollupConfig {
    /// Returns the rollup config for the deploy config, anchored at the provided genesis hashes.
    pub fn from_deploy_config(
        config: &DeployConfig,
        deployments: &Deployments,
        l1_genesis_hash: B256,
        l2_genesis_hash: B256,
    ) -> Self {
        Self {
            genesis: RollupGenesis {
                l1: BlockInfo::new(0, l1_genesis_hash),
                l2: BlockInfo::new(0, l2_genesis_hash),
                l2_time: config.l1_genesis_block_timestamp,
                system_config: SystemConfig {
                    batcher_addr: config.batch_sender_address,
                    overhead: B256::from(U256::from(config.gas_price_oracle_overhead)),
                    scalar: B256::from(U256::from(config.gas_price_oracle_scalar)),
                    gas_limit: config.l2_genesis_block_gas_limit,
                },
            },
            block_time: config.l2_block_time,
            max_sequencer_drift: config.max_sequencer_drift,
            seq_window_size: config.sequencer_window_size,
            channel_timeout: config.channel_timeout,
            l1_chain_id: config.l1_chain_id,
            l2_chain_id: config.l2_chain_id,
            regolith_time: Some(0),
            batch_inbox_address: config.batch_inbox_address,
            deposit_contract_address: deployments.optimism_portal_proxy,
            l1_system_config_address: deployments.system_config_proxy,
        }
    }

    /// Checks the config for internal consistency.
    pub fn check(&self) -> Result<(), GenesisError> {
        let invalid = |reason| Err(GenesisError::InvalidRollupConfig(reason));

        if self.genesis.l1.hash.is_zero() {
            return invalid("genesis l1 hash cannot be empty")
        }
        if self.genesis.l2.hash.is_zero() {
            return invalid("genesis l2 hash cannot be empty")
        }
        if self.genesis.l2_time == 0 {
            return invalid("missing l2 genesis time")
        }
        if self.genesis.system_config.batcher_addr.is_zero() {
            return invalid("missing genesis system config batcher address")
        }
        if self.block_time == 0 {
            return invalid("block time cannot be 0")
        }
        if self.max_sequencer_drift == 0 {
            return invalid("max sequencer drift cannot be 0")
        }
        if self.seq_window_size < 2 {
            return invalid("sequencing window size must be at least 2")
        }
        if self.channel_timeout == 0 {
            return invalid("channel timeout cannot be 0")
        }
        if self.l1_chain_id == 0 {
            return invalid("l1 chain id cannot be 0")
        }
        if self.l2_chain_id == 0 {
            return invalid("l2 chain id cannot be 0")
        }
        if self.l1_chain_id == self.l2_chain_id {
            return invalid("l1 and l2 chain ids must differ")
        }
        if self.batch_inbox_address.is_zero() {
            return invalid("missing batch inbox address")
        }
        if self.deposit_contract_address.is_zero() {
            return invalid("missing deposit contract address")
        }
        if self.l1_system_config_address.is_zero() {
            return invalid("missing system config address")
        }
        Ok(())
    }

    /// Checks that the genesis blocks referenced by the config are the blocks described by the
    /// provided genesis files.
    pub fn check_genesis(&self, l1: &Genesis, l2: &Genesis) -> Result<(), GenesisError> {
        let l1_hash = genesis_hash(l1);
        if self.genesis.l1.hash != l1_hash {
            return Err(GenesisError::GenesisMismatch {
                chain: "l1",
                expected: self.genesis.l1.hash,
                actual: l1_hash,
            })
        }
        let l2_hash = genesis_hash(l2);
        if self.genesis.l2.hash != l2_hash {
            return Err(GenesisError::GenesisMismatch {
                chain: "l2",
                expected: self.genesis.l2.hash,
                actual: l2_hash,
            })
        }
        if self.genesis.l2_time != l2.timestamp {
            return Err(GenesisError::InvalidRollupConfig("l2 genesis time does not match l2 genesis"))
        }
        Ok(())
    }
}

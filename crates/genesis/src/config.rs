use alloy_primitives::{Address, U256};
use devnet_primitives::{
    constants::{BATCH_INBOX_ADDRESS, L1_CHAIN_ID, L2_CHAIN_ID},
    SequencerDevnetParams,
};
use devnet_signer::Addresses;
use serde::{Deserialize, Serialize};

/// One gwei, the genesis base fee of both chains.
const GENESIS_BASE_FEE: u64 = 1_000_000_000;

/// The gas limit of both genesis blocks.
const GENESIS_GAS_LIMIT: u64 = 15_000_000;

/// Balance given to every dev account in both genesis blocks.
const DEV_ACCOUNT_BALANCE: U256 = U256::from_limbs([0, 0x10000, 0, 0]);

/// Declarative description of a devnet deployment, from which every genesis file and the rollup
/// config are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    /// The L1 chain id.
    pub l1_chain_id: u64,
    /// The L2 chain id.
    pub l2_chain_id: u64,
    /// L2 block time, in seconds.
    pub l2_block_time: u64,
    /// Seconds before an L2 output can be used to finalize a withdrawal.
    pub finalization_period_seconds: u64,
    /// Maximum drift of L2 time over its L1 origin, in seconds.
    pub max_sequencer_drift: u64,
    /// Sequencing window, in L1 blocks.
    pub sequencer_window_size: u64,
    /// Channel timeout, in L1 blocks.
    pub channel_timeout: u64,
    /// Address whose signature is accepted on gossiped unsafe blocks.
    pub p2p_sequencer_address: Address,
    /// Address batches are sent to.
    pub batch_inbox_address: Address,
    /// Address batches are accepted from.
    pub batch_sender_address: Address,
    /// Owner of the L1 contracts.
    pub final_system_owner: Address,
    /// Number of L2 blocks between output submissions.
    pub l2_output_oracle_submission_interval: u64,
    /// Address outputs are accepted from.
    pub l2_output_oracle_proposer: Address,

    /// L1 block time, in seconds. Used as the clique period.
    pub l1_block_time: u64,
    /// The single clique signer of L1.
    pub clique_signer_address: Address,
    /// Timestamp of the L1 genesis block, which the L2 genesis inherits.
    pub l1_genesis_block_timestamp: u64,
    /// Gas limit of the L1 genesis block.
    pub l1_genesis_block_gas_limit: u64,
    /// Base fee of the L1 genesis block.
    pub l1_genesis_block_base_fee_per_gas: u64,

    /// Gas limit of the L2 genesis block.
    pub l2_genesis_block_gas_limit: u64,
    /// Base fee of the L2 genesis block.
    pub l2_genesis_block_base_fee_per_gas: u64,

    /// L1 fee overhead charged on L2 transactions.
    pub gas_price_oracle_overhead: u64,
    /// L1 fee scalar charged on L2 transactions.
    pub gas_price_oracle_scalar: u64,
    #[serde(rename = "eip1559Elasticity")]
    /// L2 EIP-1559 elasticity multiplier.
    pub eip1559_elasticity: u64,
    #[serde(rename = "eip1559Denominator")]
    /// L2 EIP-1559 base fee change denominator.
    pub eip1559_denominator: u64,

    /// Accounts pre-funded on both chains.
    pub dev_accounts: Vec<Address>,
    /// Balance of every dev account.
    pub dev_account_balance: U256,
}

impl DeployConfig {
    /// Returns the deploy config of a devnet with the given params, keyed to the devnet
    /// addresses, whose L1 genesis has the provided timestamp.
    pub fn new(
        params: &SequencerDevnetParams,
        addresses: &Addresses,
        l1_genesis_timestamp: u64,
    ) -> Self {
        Self {
            l1_chain_id: L1_CHAIN_ID,
            l2_chain_id: L2_CHAIN_ID,
            l2_block_time: 2,
            finalization_period_seconds: 2,
            max_sequencer_drift: params.max_seq_drift,
            sequencer_window_size: params.seq_window_size,
            channel_timeout: params.chan_timeout,
            p2p_sequencer_address: addresses.sequencer_p2p,
            batch_inbox_address: BATCH_INBOX_ADDRESS,
            batch_sender_address: addresses.batcher,
            final_system_owner: addresses.deployer,
            l2_output_oracle_submission_interval: 6,
            l2_output_oracle_proposer: addresses.proposer,
            l1_block_time: 15,
            clique_signer_address: addresses.clique_signer,
            l1_genesis_block_timestamp: l1_genesis_timestamp,
            l1_genesis_block_gas_limit: GENESIS_GAS_LIMIT,
            l1_genesis_block_base_fee_per_gas: GENESIS_BASE_FEE,
            l2_genesis_block_gas_limit: GENESIS_GAS_LIMIT,
            l2_genesis_block_base_fee_per_gas: GENESIS_BASE_FEE,
            gas_price_oracle_overhead: 2100,
            gas_price_oracle_scalar: 1_000_000,
            eip1559_elasticity: 10,
            eip1559_denominator: 50,
            dev_accounts: addresses.dev_accounts().to_vec(),
            dev_account_balance: DEV_ACCOUNT_BALANCE,
        }
    }

    /// Sets the L1 block time.
    pub const fn with_l1_block_time(mut self, seconds: u64) -> Self {
        self.l1_block_time = seconds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devnet_signer::MnemonicConfig;

    #[test]
    fn test_deploy_config_uses_params_and_roles() {
        let addresses = MnemonicConfig::default().secrets().unwrap().addresses();
        let params = SequencerDevnetParams::new(120, 2, 30);
        let config = DeployConfig::new(&params, &addresses, 1_700_000_000);

        assert_eq!(config.max_sequencer_drift, 120);
        assert_eq!(config.sequencer_window_size, 2);
        assert_eq!(config.channel_timeout, 30);
        assert_eq!(config.batch_sender_address, addresses.batcher);
        assert_eq!(config.clique_signer_address, addresses.clique_signer);
        assert_eq!(config.dev_accounts.len(), 9);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["eip1559Elasticity"], 10);
        assert_eq!(json["l2BlockTime"], 2);
    }
}

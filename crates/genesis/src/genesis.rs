use crate::{DeployConfig, DevnetArtifacts, GenesisError};
use alloy_genesis::{ChainConfig, CliqueConfig, Genesis, GenesisAccount};
use alloy_primitives::{Address, Bytes, B256, U256};
use reth_chainspec::ChainSpec;
use std::collections::BTreeMap;

/// The clique epoch length of the L1 chain.
const CLIQUE_EPOCH: u64 = 30_000;

/// Vanity prefix of the clique extra data.
const CLIQUE_EXTRA_VANITY: usize = 32;

/// Seal suffix of the clique extra data.
const CLIQUE_EXTRA_SEAL: usize = 65;

/// Returns the L1 genesis: a clique chain with the devnet signer as its only authority.
pub fn l1_genesis(config: &DeployConfig, artifacts: &DevnetArtifacts) -> Result<Genesis, GenesisError> {
    if config.clique_signer_address.is_zero() {
        return Err(GenesisError::InvalidDeployConfig("missing clique signer address"))
    }
    if config.l1_block_time == 0 {
        return Err(GenesisError::InvalidDeployConfig("l1 block time must be positive"))
    }

    let chain_config = ChainConfig {
        chain_id: config.l1_chain_id,
        clique: Some(CliqueConfig { period: Some(config.l1_block_time), epoch: Some(CLIQUE_EPOCH) }),
        ..pre_merge_forks()
    };

    let mut alloc = dev_allocs(config);
    alloc.extend(artifacts.l1_allocs.clone());

    let mut genesis = Genesis { config: chain_config, alloc, ..Default::default() }
        .with_nonce(0)
        .with_timestamp(config.l1_genesis_block_timestamp)
        .with_extra_data(clique_extra_data(config.clique_signer_address))
        .with_gas_limit(config.l1_genesis_block_gas_limit)
        .with_difficulty(U256::from(1))
        .with_mix_hash(B256::ZERO)
        .with_coinbase(Address::ZERO)
        .with_base_fee(Some(config.l1_genesis_block_base_fee_per_gas as u128));
    genesis.number = Some(0);
    genesis.parent_hash = Some(B256::ZERO);

    Ok(genesis)
}

/// Returns the L2 genesis, built on top of the provided L1 genesis block.
///
/// The L2 genesis shares its timestamp with the L1 genesis block so that the first L2 block can
/// use the L1 genesis block as its origin.
pub fn l2_genesis(
    config: &DeployConfig,
    l1: &Genesis,
    artifacts: &DevnetArtifacts,
) -> Result<Genesis, GenesisError> {
    if l1.timestamp != config.l1_genesis_block_timestamp {
        return Err(GenesisError::InvalidDeployConfig("l1 genesis does not match deploy config"))
    }

    let mut chain_config = ChainConfig {
        chain_id: config.l2_chain_id,
        merge_netsplit_block: Some(0),
        terminal_total_difficulty: Some(U256::ZERO),
        terminal_total_difficulty_passed: true,
        ..pre_merge_forks()
    };
    chain_config.extra_fields.insert("bedrockBlock".to_string(), serde_json::json!(0));
    chain_config.extra_fields.insert("regolithTime".to_string(), serde_json::json!(0));
    chain_config.extra_fields.insert(
        "optimism".to_string(),
        serde_json::json!({
            "eip1559Elasticity": config.eip1559_elasticity,
            "eip1559Denominator": config.eip1559_denominator,
        }),
    );

    let mut alloc = dev_allocs(config);
    alloc.extend(artifacts.l2_allocs.clone());

    let mut genesis = Genesis { config: chain_config, alloc, ..Default::default() }
        .with_nonce(0)
        .with_timestamp(l1.timestamp)
        .with_extra_data(Bytes::new())
        .with_gas_limit(config.l2_genesis_block_gas_limit)
        .with_difficulty(U256::ZERO)
        .with_mix_hash(B256::ZERO)
        .with_coinbase(Address::ZERO)
        .with_base_fee(Some(config.l2_genesis_block_base_fee_per_gas as u128));
    genesis.number = Some(0);
    genesis.parent_hash = Some(B256::ZERO);

    Ok(genesis)
}

/// Computes the hash of the genesis block described by `genesis`.
pub fn genesis_hash(genesis: &Genesis) -> B256 {
    ChainSpec::from(genesis.clone()).genesis_hash()
}

fn pre_merge_forks() -> ChainConfig {
    ChainConfig {
        homestead_block: Some(0),
        eip150_block: Some(0),
        eip155_block: Some(0),
        eip158_block: Some(0),
        byzantium_block: Some(0),
        constantinople_block: Some(0),
        petersburg_block: Some(0),
        istanbul_block: Some(0),
        muir_glacier_block: Some(0),
        berlin_block: Some(0),
        london_block: Some(0),
        arrow_glacier_block: Some(0),
        gray_glacier_block: Some(0),
        ..Default::default()
    }
}

fn dev_allocs(config: &DeployConfig) -> BTreeMap<Address, GenesisAccount> {
    config
        .dev_accounts
        .iter()
        .map(|address| {
            (*address, GenesisAccount { balance: config.dev_account_balance, ..Default::default() })
        })
        .collect()
}

fn clique_extra_data(signer: Address) -> Bytes {
    let mut extra = vec![0u8; CLIQUE_EXTRA_VANITY];
    extra.extend_from_slice(signer.as_slice());
    extra.extend_from_slice(&[0u8; CLIQUE_EXTRA_SEAL]);
    extra.into()
}

//! Chain configuration of the devnet.
//!
//! The L1 genesis is a clique chain signed by the devnet clique signer. The L2 genesis is built
//! on top of the L1 genesis block and the rollup config ties the two together. Contract code for
//! both chains is supplied as [`DevnetArtifacts`] since compiling the contracts is outside the
//! scope of the harness.

mod artifacts;
pub use artifacts::{DevnetArtifacts, Deployments};

mod config;
pub use config::DeployConfig;

mod error;
pub use error::GenesisError;

mod genesis;
pub use genesis::{genesis_hash, l1_genesis, l2_genesis};

mod rollup;
pub use rollup::{RollupConfig, RollupGenesis, SystemConfig};

/// The L1 genesis, the L2 genesis and the rollup config of a devnet.
#[derive(Debug, Clone)]
pub struct ChainConfigs {
    /// The L1 genesis.
    pub l1: alloy_genesis::Genesis,
    /// The L2 genesis.
    pub l2: alloy_genesis::Genesis,
    /// The rollup config.
    pub rollup: RollupConfig,
}

impl ChainConfigs {
    /// Builds every chain configuration from the deploy config and validates the result.
    ///
    /// The L2 genesis depends on the L1 genesis block and the rollup config depends on both, so
    /// they are built in that order.
    pub fn build(
        config: &DeployConfig,
        artifacts: &DevnetArtifacts,
        extra_l2_allocs: impl IntoIterator<Item = (alloy_primitives::Address, alloy_genesis::GenesisAccount)>,
    ) -> Result<Self, GenesisError> {
        let l1 = l1_genesis(config, artifacts)?;
        let mut l2 = l2_genesis(config, &l1, artifacts)?;
        l2.alloc.extend(extra_l2_allocs);

        let rollup = RollupConfig::from_deploy_config(
            config,
            &artifacts.deployments,
            genesis_hash(&l1),
            genesis_hash(&l2),
        );
        rollup.check()?;
        rollup.check_genesis(&l1, &l2)?;

        tracing::info!(
            target: "devnet::genesis",
            l1_genesis = %rollup.genesis.l1.hash,
            l2_genesis = %rollup.genesis.l2.hash,
            "created genesis configs"
        );

        Ok(Self { l1, l2, rollup })
    }
}

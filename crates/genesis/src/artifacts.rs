use crate::GenesisError;
use alloy_genesis::GenesisAccount;
use alloy_primitives::{address, Address};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

/// File holding the L1 contract allocations.
const L1_ALLOCS_FILE: &str = "l1-allocs.json";
/// File holding the L2 predeploy allocations.
const L2_ALLOCS_FILE: &str = "l2-allocs.json";
/// File holding the L1 deployment addresses.
const ADDRESSES_FILE: &str = "addresses.json";

/// Addresses of the L1 contracts of the devnet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Deployments {
    /// The output oracle proxy.
    #[serde(rename = "L2OutputOracleProxy")]
    pub l2_output_oracle_proxy: Address,
    /// The portal proxy, which is also the deposit contract.
    pub optimism_portal_proxy: Address,
    /// The cross domain messenger proxy.
    #[serde(rename = "L1CrossDomainMessengerProxy")]
    pub l1_cross_domain_messenger_proxy: Address,
    /// The standard bridge proxy.
    #[serde(rename = "L1StandardBridgeProxy")]
    pub l1_standard_bridge_proxy: Address,
    /// The system config proxy.
    pub system_config_proxy: Address,
}

impl Default for Deployments {
    /// The fixed addresses contracts are placed at in the developer L1 genesis.
    fn default() -> Self {
        Self {
            l2_output_oracle_proxy: address!("0x6900000000000000000000000000000000000000"),
            optimism_portal_proxy: address!("0x6900000000000000000000000000000000000001"),
            l1_cross_domain_messenger_proxy: address!("0x6900000000000000000000000000000000000002"),
            l1_standard_bridge_proxy: address!("0x6900000000000000000000000000000000000003"),
            system_config_proxy: address!("0x6900000000000000000000000000000000000009"),
        }
    }
}

/// Pre-built contract state for both chains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevnetArtifacts {
    /// Accounts placed in the L1 genesis, typically the deployed L1 contracts.
    pub l1_allocs: BTreeMap<Address, GenesisAccount>,
    /// Accounts placed in the L2 genesis, typically the predeploys.
    pub l2_allocs: BTreeMap<Address, GenesisAccount>,
    /// Where the L1 contracts live.
    pub deployments: Deployments,
}

impl DevnetArtifacts {
    /// Loads the artifacts from a directory. Missing files fall back to empty allocations and
    /// the default deployment addresses.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, GenesisError> {
        let dir = dir.as_ref();
        Ok(Self {
            l1_allocs: read_optional(&dir.join(L1_ALLOCS_FILE))?.unwrap_or_default(),
            l2_allocs: read_optional(&dir.join(L2_ALLOCS_FILE))?.unwrap_or_default(),
            deployments: read_optional(&dir.join(ADDRESSES_FILE))?.unwrap_or_default(),
        })
    }
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, GenesisError> {
    if !path.exists() {
        tracing::debug!(target: "devnet::genesis", path = %path.display(), "artifact not found, using defaults");
        return Ok(None)
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|source| GenesisError::Io { path: path.to_path_buf(), source })?;
    Ok(Some(serde_json::from_str(&raw)?))
}

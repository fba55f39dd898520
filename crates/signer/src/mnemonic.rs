use crate::SignerError;
use alloy_primitives::Address;
use alloy_signer_local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};

/// The mnemonic used by the devnet unless configured otherwise.
pub const DEFAULT_MNEMONIC: &str = "test test test test test test test test test test test junk";

/// The account index p2p identities of rollup nodes start at.
const P2P_KEY_BASE_INDEX: u32 = 10;

/// A mnemonic with the HD derivation paths of every devnet role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MnemonicConfig {
    /// The mnemonic phrase.
    pub mnemonic: String,
    /// Path of the L1 clique signer.
    pub clique_signer_path: String,
    /// Path of the output proposer.
    pub proposer_path: String,
    /// Path of the batch submitter.
    pub batcher_path: String,
    /// Path of the contract deployer.
    pub deployer_path: String,
    /// Path of the dev account alice.
    pub alice_path: String,
    /// Path of the key the sequencer signs p2p block gossip with.
    pub sequencer_p2p_path: String,
    /// Path of the dev account bob.
    pub bob_path: String,
    /// Path of the dev account mallory.
    pub mallory_path: String,
    /// Path of the system config owner.
    pub sys_cfg_owner_path: String,
}

impl Default for MnemonicConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MNEMONIC)
    }
}

impl MnemonicConfig {
    /// Returns a new [`MnemonicConfig`] for the given phrase with the standard role paths.
    pub fn new(mnemonic: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            clique_signer_path: account_path(0),
            proposer_path: account_path(1),
            batcher_path: account_path(2),
            deployer_path: account_path(3),
            alice_path: account_path(4),
            sequencer_p2p_path: account_path(5),
            bob_path: account_path(7),
            mallory_path: account_path(8),
            sys_cfg_owner_path: account_path(9),
        }
    }

    /// Derives the key at the provided path.
    pub fn derive(&self, path: &str) -> Result<PrivateKeySigner, SignerError> {
        let derivation_error =
            |source| SignerError::Derivation { path: path.to_string(), source };
        MnemonicBuilder::<English>::default()
            .phrase(self.mnemonic.as_str())
            .derivation_path(path)
            .map_err(derivation_error)?
            .build()
            .map_err(derivation_error)
    }

    /// Derives the full secret bundle of the devnet.
    pub fn secrets(&self) -> Result<Secrets, SignerError> {
        Ok(Secrets {
            clique_signer: self.derive(&self.clique_signer_path)?,
            proposer: self.derive(&self.proposer_path)?,
            batcher: self.derive(&self.batcher_path)?,
            deployer: self.derive(&self.deployer_path)?,
            alice: self.derive(&self.alice_path)?,
            sequencer_p2p: self.derive(&self.sequencer_p2p_path)?,
            bob: self.derive(&self.bob_path)?,
            mallory: self.derive(&self.mallory_path)?,
            sys_cfg_owner: self.derive(&self.sys_cfg_owner_path)?,
        })
    }

    /// Returns the derivation path of the p2p identity of the rollup node at `index`.
    pub fn p2p_key_path(&self, index: u32) -> String {
        account_path(P2P_KEY_BASE_INDEX + index)
    }

    /// Derives the p2p identity of the rollup node at `index`.
    pub fn p2p_key_for(&self, index: u32) -> Result<PrivateKeySigner, SignerError> {
        self.derive(&self.p2p_key_path(index))
    }
}

fn account_path(index: u32) -> String {
    format!("m/44'/60'/0'/0/{index}")
}

/// The private keys of every devnet role.
///
/// Intentionally has no `Display` implementation. Use [`Secrets::addresses`] for anything that
/// ends up in logs.
#[derive(Debug, Clone)]
pub struct Secrets {
    /// Signs L1 blocks under clique.
    pub clique_signer: PrivateKeySigner,
    /// Submits L2 outputs to L1.
    pub proposer: PrivateKeySigner,
    /// Submits L2 batches to L1.
    pub batcher: PrivateKeySigner,
    /// Deploys the L1 contracts.
    pub deployer: PrivateKeySigner,
    /// Dev account.
    pub alice: PrivateKeySigner,
    /// Signs sequencer block gossip.
    pub sequencer_p2p: PrivateKeySigner,
    /// Dev account.
    pub bob: PrivateKeySigner,
    /// Dev account.
    pub mallory: PrivateKeySigner,
    /// Owns the L1 system config.
    pub sys_cfg_owner: PrivateKeySigner,
}

impl Secrets {
    /// Returns the public addresses of the secrets.
    pub fn addresses(&self) -> Addresses {
        Addresses {
            clique_signer: self.clique_signer.address(),
            proposer: self.proposer.address(),
            batcher: self.batcher.address(),
            deployer: self.deployer.address(),
            alice: self.alice.address(),
            sequencer_p2p: self.sequencer_p2p.address(),
            bob: self.bob.address(),
            mallory: self.mallory.address(),
            sys_cfg_owner: self.sys_cfg_owner.address(),
        }
    }
}

/// The public addresses of every devnet role.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Addresses {
    /// Address of [`Secrets::clique_signer`].
    pub clique_signer: Address,
    /// Address of [`Secrets::proposer`].
    pub proposer: Address,
    /// Address of [`Secrets::batcher`].
    pub batcher: Address,
    /// Address of [`Secrets::deployer`].
    pub deployer: Address,
    /// Address of [`Secrets::alice`].
    pub alice: Address,
    /// Address of [`Secrets::sequencer_p2p`].
    pub sequencer_p2p: Address,
    /// Address of [`Secrets::bob`].
    pub bob: Address,
    /// Address of [`Secrets::mallory`].
    pub mallory: Address,
    /// Address of [`Secrets::sys_cfg_owner`].
    pub sys_cfg_owner: Address,
}

impl Addresses {
    /// Returns every dev account that is pre-funded in the genesis blocks.
    pub const fn dev_accounts(&self) -> [Address; 9] {
        [
            self.clique_signer,
            self.proposer,
            self.batcher,
            self.deployer,
            self.alice,
            self.sequencer_p2p,
            self.bob,
            self.mallory,
            self.sys_cfg_owner,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_secrets_are_deterministic() {
        let config = MnemonicConfig::default();
        let first = config.secrets().unwrap().addresses();
        let second = config.secrets().unwrap().addresses();
        assert_eq!(first, second);

        // account 0 of the well known test mnemonic.
        assert_eq!(first.clique_signer, address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert_eq!(first.proposer, address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"));
    }

    #[test]
    fn test_p2p_key_is_deterministic_per_index() {
        let config = MnemonicConfig::default();
        let a = config.p2p_key_for(3).unwrap();
        let b = config.p2p_key_for(3).unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());

        let other = config.p2p_key_for(4).unwrap();
        assert_ne!(a.to_bytes(), other.to_bytes());
    }

    #[test]
    fn test_p2p_keys_do_not_collide_with_roles() {
        let config = MnemonicConfig::default();
        let addresses = config.secrets().unwrap().addresses();
        for index in 0..4 {
            let p2p = config.p2p_key_for(index).unwrap().address();
            assert!(!addresses.dev_accounts().contains(&p2p));
        }
    }

    #[test]
    fn test_invalid_path() {
        let config = MnemonicConfig::default();
        let err = config.derive("not a path").unwrap_err();
        assert!(matches!(err, SignerError::Derivation { .. }));
    }

    #[test]
    fn test_different_mnemonic_yields_different_keys() {
        let a = MnemonicConfig::default().secrets().unwrap().addresses();
        let b = MnemonicConfig::new(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
        )
        .secrets()
        .unwrap()
        .addresses();
        assert_ne!(a.batcher, b.batcher);
    }
}

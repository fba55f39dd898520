//! Deterministic key material for the devnet.
//!
//! Every key used by the fleet (the clique signer, batcher, proposer, sequencer p2p key and the
//! per-node p2p identities) is derived from a single mnemonic. Deriving twice from the same
//! mnemonic always yields the same keys, which keeps p2p addresses stable across restarts of a
//! node within a test run.

mod error;
pub use error::SignerError;

mod mnemonic;
pub use mnemonic::{Addresses, MnemonicConfig, Secrets, DEFAULT_MNEMONIC};

mod p2p;
pub use p2p::{encode_private_key, p2p_multiaddr, peer_id};

pub use alloy_signer_local::PrivateKeySigner;

//! Orchestration of an OP-stack devnet.
//!
//! A [`Devnet`] owns the chain configuration and every node of the network. Nodes are added one
//! role at a time, each wired to the nodes it depends on, and can be shut down individually to
//! inject faults.

mod contracts;
pub use contracts::{
    L2OutputOracle, L2ToL1MessagePasser, OptimismPortal, OutputProposal, OutputRootProof,
    WithdrawalTransaction, L2_TO_L1_MESSAGE_PASSER,
};

mod devnet;
pub use devnet::{Devnet, DevnetConfig};

mod env;
pub use env::{BatcherConfig, ProposerConfig};

mod error;
pub use error::DevnetError;

mod vault;
pub use vault::Vault;

mod withdrawal;

use alloy_json_rpc::RpcError;
use alloy_primitives::{Address, TxHash};
use alloy_rpc_types_eth::BlockNumberOrTag;
use alloy_transport::TransportErrorKind;
use devnet_genesis::GenesisError;
use devnet_node::{NodeError, Role, RuntimeError};
use devnet_signer::SignerError;
use devnet_watcher::WaitError;

/// An error returned by the [`crate::Devnet`].
#[derive(Debug, thiserror::Error)]
pub enum DevnetError {
    /// The chain configuration must be created first.
    #[error("chain configuration not initialized")]
    ChainNotInitialized,
    /// The chain configuration was already created.
    #[error("chain configuration already initialized")]
    ChainAlreadyInitialized,
    /// No client can play the role.
    #[error("no {0} client types found")]
    MissingClientType(Role),
    /// A node index is out of range.
    #[error("only have {len} {role} nodes, cannot find {index}")]
    IndexOutOfRange {
        /// The role of the node.
        role: Role,
        /// The requested index.
        index: usize,
        /// The number of nodes of the role.
        len: usize,
    },
    /// A node of the role is already running.
    #[error("{0} is already running")]
    AlreadyRunning(Role),
    /// No node of the role is running.
    #[error("{0} is not running")]
    NotRunning(Role),
    /// A live rollup node already sequences.
    #[error("a sequencer is already running")]
    SequencerAlreadyRunning,
    /// The account was not created by the vault.
    #[error("unknown vault account {0}")]
    UnknownAccount(Address),
    /// A transaction was included but reverted.
    #[error("transaction {0} reverted")]
    TransactionReverted(TxHash),
    /// No withdrawal was initiated by the transaction.
    #[error("transaction {0} initiated no withdrawal")]
    MissingWithdrawal(TxHash),
    /// The node does not have the block.
    #[error("missing block {0}")]
    MissingBlock(BlockNumberOrTag),
    /// The L2 output oracle holds no output for the block.
    #[error("no output proposed for L2 block #{0}")]
    MissingOutput(u64),
    /// A contract call returned data that could not be decoded.
    #[error("failed to decode contract call output: {0}")]
    Abi(#[from] alloy_sol_types::Error),
    /// Building the chain configuration failed.
    #[error(transparent)]
    Genesis(#[from] GenesisError),
    /// The container runtime failed.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// Deriving a key failed.
    #[error(transparent)]
    Signer(#[from] SignerError),
    /// A waiter failed.
    #[error(transparent)]
    Wait(#[from] WaitError),
    /// A node call failed.
    #[error(transparent)]
    Node(#[from] NodeError),
    /// An RPC call failed.
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// A configuration could not be encoded.
    #[error("failed to encode configuration: {0}")]
    Json(#[from] serde_json::Error),
}

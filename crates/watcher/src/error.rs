use alloy_json_rpc::RpcError;
use alloy_primitives::{TxHash, B256};
use alloy_transport::TransportErrorKind;
use devnet_node::NodeError;
use std::time::Duration;

/// An error returned by a waiter.
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    /// The condition did not hold before the deadline.
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout {
        /// What was waited for.
        what: String,
        /// The deadline that passed.
        after: Duration,
    },
    /// The transaction was never included before the deadline.
    #[error("no receipt for transaction {tx} after {after:?}")]
    NotFound {
        /// The transaction.
        tx: TxHash,
        /// The deadline that passed.
        after: Duration,
    },
    /// An RPC call failed.
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// A node call failed.
    #[error(transparent)]
    Node(#[from] NodeError),
    /// A replica does not follow the sequencer.
    #[error(transparent)]
    Divergence(#[from] SyncDivergence),
}

impl WaitError {
    /// Returns a [`WaitError::Timeout`] for `what`.
    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        Self::Timeout { what: what.into(), after }
    }
}

/// A replica that does not follow the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncDivergence {
    /// The replica head differs from the sequencer block at the same height.
    #[error("replica {index} diverged at #{number}: sequencer has {expected}, replica has {actual}")]
    Diverged {
        /// The index of the replica.
        index: usize,
        /// The height of the replica head.
        number: u64,
        /// The sequencer block hash at that height.
        expected: B256,
        /// The replica head hash.
        actual: B256,
    },
    /// The replica head lags the sequencer by more than allowed.
    #[error("replica {index} at #{replica_head} is too far behind sequencer at #{sequencer_head}")]
    TooFarBehind {
        /// The index of the replica.
        index: usize,
        /// The sequencer head height.
        sequencer_head: u64,
        /// The replica head height.
        replica_head: u64,
    },
}

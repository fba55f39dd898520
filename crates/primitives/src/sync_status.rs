use crate::{L1BlockRef, L2BlockRef};
use serde::{Deserialize, Serialize};

/// The sync status of a rollup node, as returned by `optimism_syncStatus`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// The L1 block the derivation process is currently at.
    pub current_l1: L1BlockRef,
    /// The L1 head as seen by the node.
    pub head_l1: L1BlockRef,
    /// The safe L1 block.
    pub safe_l1: L1BlockRef,
    /// The finalized L1 block.
    pub finalized_l1: L1BlockRef,
    /// The unsafe L2 head, possibly received over p2p.
    pub unsafe_l2: L2BlockRef,
    /// The L2 head derived from L1 data.
    pub safe_l2: L2BlockRef,
    /// The L2 head derived from finalized L1 data.
    pub finalized_l2: L2BlockRef,
}

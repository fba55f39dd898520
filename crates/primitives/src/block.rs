use alloy_eips::BlockNumHash;
use alloy_primitives::B256;
use alloy_rpc_types_engine::{ExecutionPayload, ExecutionPayloadV1};
use serde::{Deserialize, Serialize};

/// Information about a block.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockInfo {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
}

impl BlockInfo {
    /// Returns a new instance of [`BlockInfo`].
    pub const fn new(number: u64, hash: B256) -> Self {
        Self { number, hash }
    }
}

impl From<&ExecutionPayload> for BlockInfo {
    fn from(value: &ExecutionPayload) -> Self {
        Self { number: value.block_number(), hash: value.block_hash() }
    }
}

impl From<&ExecutionPayloadV1> for BlockInfo {
    fn from(value: &ExecutionPayloadV1) -> Self {
        Self { number: value.block_number, hash: value.block_hash }
    }
}

impl From<BlockNumHash> for BlockInfo {
    fn from(value: BlockNumHash) -> Self {
        Self { number: value.number, hash: value.hash }
    }
}

impl From<BlockInfo> for BlockNumHash {
    fn from(value: BlockInfo) -> Self {
        Self { number: value.number, hash: value.hash }
    }
}

impl core::fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{} ({})", self.number, self.hash)
    }
}

/// A reference to an L1 block as reported by a rollup node.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L1BlockRef {
    /// The block hash.
    pub hash: B256,
    /// The block number.
    pub number: u64,
    /// The parent block hash.
    pub parent_hash: B256,
    /// The block timestamp.
    pub timestamp: u64,
}

impl L1BlockRef {
    /// Returns the [`BlockInfo`] of the reference.
    pub const fn block_info(&self) -> BlockInfo {
        BlockInfo::new(self.number, self.hash)
    }
}

/// A reference to an L2 block as reported by a rollup node, including the L1 origin it was
/// derived from.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L2BlockRef {
    /// The block hash.
    pub hash: B256,
    /// The block number.
    pub number: u64,
    /// The parent block hash.
    pub parent_hash: B256,
    /// The block timestamp.
    pub timestamp: u64,
    /// The L1 block this L2 block was derived from.
    #[serde(rename = "l1origin")]
    pub l1_origin: BlockInfo,
    /// Distance to the first block of the epoch.
    pub sequence_number: u64,
}

impl L2BlockRef {
    /// Returns the [`BlockInfo`] of the reference.
    pub const fn block_info(&self) -> BlockInfo {
        BlockInfo::new(self.number, self.hash)
    }
}

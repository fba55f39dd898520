use alloy_rpc_types_engine::ForkchoiceState as AlloyForkchoiceState;
use devnet_primitives::BlockInfo;

/// The head, safe and finalized blocks sent with `engine_forkchoiceUpdatedV1`.
///
/// Syncing and building only ever move the head, the safe and finalized blocks stay at whatever
/// the node reported when the operation started.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ForkchoiceState {
    /// The head block.
    pub head: BlockInfo,
    /// The safe block.
    pub safe: BlockInfo,
    /// The finalized block.
    pub finalized: BlockInfo,
}

impl ForkchoiceState {
    /// Returns a new [`ForkchoiceState`].
    pub const fn new(head: BlockInfo, safe: BlockInfo, finalized: BlockInfo) -> Self {
        Self { head, safe, finalized }
    }

    /// Moves the head to `head`.
    pub const fn with_head(mut self, head: BlockInfo) -> Self {
        self.head = head;
        self
    }

    /// Returns the state as sent over the Engine API.
    pub const fn to_alloy(&self) -> AlloyForkchoiceState {
        AlloyForkchoiceState {
            head_block_hash: self.head.hash,
            safe_block_hash: self.safe.hash,
            finalized_block_hash: self.finalized.hash,
        }
    }
}

impl From<ForkchoiceState> for AlloyForkchoiceState {
    fn from(state: ForkchoiceState) -> Self {
        state.to_alloy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    #[test]
    fn test_with_head_keeps_safe_and_finalized() {
        let finalized = BlockInfo::new(1, B256::with_last_byte(1));
        let safe = BlockInfo::new(2, B256::with_last_byte(2));
        let state = ForkchoiceState::new(safe, safe, finalized).with_head(BlockInfo::new(5, B256::with_last_byte(5)));

        let alloy: AlloyForkchoiceState = state.into();
        assert_eq!(alloy.head_block_hash, B256::with_last_byte(5));
        assert_eq!(alloy.safe_block_hash, safe.hash);
        assert_eq!(alloy.finalized_block_hash, finalized.hash);
    }
}

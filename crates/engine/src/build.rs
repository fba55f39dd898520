use crate::{finalized_and_safe, EngineNode, EnginePayloadAttributes, ForkchoiceState, SyncError};
use alloy_eips::BlockId;
use alloy_primitives::{keccak256, B256};
use alloy_rpc_types_engine::{ExecutionPayloadV1, PayloadAttributes};
use std::time::Duration;
use tracing::info;

/// Options of [`build_block`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BlockBuildOpts {
    /// How many blocks below the head to build on. Zero builds on the head, anything more
    /// creates an alternative branch.
    pub reorg_depth: u64,
    /// Seconds between the base block and the new block.
    pub time_delta: u64,
    /// How long the engine gets to fill the block before it is retrieved.
    pub building_time: Duration,
}

/// Returns the `prevRandao` value of the block at `number`.
///
/// This is not randomness. It only needs to vary per height and be reproducible across runs.
pub fn fake_prev_randao(number: u64) -> B256 {
    keccak256(number.to_be_bytes())
}

/// Builds a new block on the node through its Engine API and makes it the head.
///
/// The block is built on the block `reorg_depth` blocks below the current head, keeping the safe
/// and finalized blocks of the node. Returns the new payload.
pub async fn build_block<N>(node: &N, opts: BlockBuildOpts) -> Result<ExecutionPayloadV1, SyncError>
where
    N: EngineNode + ?Sized,
{
    let head = node
        .block_ref(BlockId::latest())
        .await?
        .ok_or_else(|| SyncError::MissingBlock("head".to_string()))?;
    if opts.reorg_depth > head.number {
        return Err(SyncError::ReorgTooDeep { depth: opts.reorg_depth, head: head.number })
    }
    let (finalized, safe) = finalized_and_safe(node).await?;

    let base_number = head.number - opts.reorg_depth;
    let base = node
        .execution_payload_by_block(BlockId::number(base_number))
        .await?
        .ok_or_else(|| SyncError::MissingBlock(format!("reorg base {base_number}")))?;

    let fcs = ForkchoiceState::new((&base).into(), safe.block_info(), finalized.block_info());
    let attributes = EnginePayloadAttributes::new(PayloadAttributes {
        timestamp: base.timestamp + opts.time_delta,
        prev_randao: fake_prev_randao(base.block_number + 1),
        suggested_fee_recipient: base.fee_recipient,
        withdrawals: None,
        parent_beacon_block_root: None,
    });

    let forkchoice_updated = node.forkchoice_updated(fcs.to_alloy(), Some(attributes)).await?;
    if !forkchoice_updated.payload_status.status.is_valid() {
        return Err(SyncError::ForkchoiceNotValid {
            head: base.block_hash,
            status: forkchoice_updated.payload_status.status,
        })
    }
    let payload_id =
        forkchoice_updated.payload_id.ok_or(SyncError::MissingPayloadId(base.block_hash))?;

    tokio::time::sleep(opts.building_time).await;
    let payload = node.get_payload(payload_id).await?;

    let status = node.new_payload(payload.clone()).await?;
    if !status.status.is_valid() {
        return Err(SyncError::PayloadNotValid {
            block: (&payload).into(),
            payload: Box::new(payload),
            status: status.status,
        })
    }

    let fcs = fcs.with_head((&payload).into());
    let forkchoice_updated = node.forkchoice_updated(fcs.to_alloy(), None).await?;
    if !forkchoice_updated.payload_status.status.is_valid() {
        return Err(SyncError::ForkchoiceNotValid {
            head: payload.block_hash,
            status: forkchoice_updated.payload_status.status,
        })
    }

    info!(
        target: "devnet::sync",
        number = payload.block_number,
        hash = %payload.block_hash,
        reorg_depth = opts.reorg_depth,
        "built block"
    );
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChain;

    #[test]
    fn test_fake_prev_randao_is_deterministic() {
        assert_eq!(fake_prev_randao(7), fake_prev_randao(7));
        assert_ne!(fake_prev_randao(7), fake_prev_randao(8));
        assert_eq!(fake_prev_randao(1), keccak256([0u8, 0, 0, 0, 0, 0, 0, 1]));
    }

    #[tokio::test]
    async fn test_build_on_head() {
        let chain = MockChain::new();
        chain.extend(3, 0);
        let head = chain.head();

        let payload =
            build_block(&chain, BlockBuildOpts { time_delta: 2, ..Default::default() }).await.unwrap();

        assert_eq!(payload.parent_hash, head.hash);
        assert_eq!(payload.block_number, head.number + 1);
        assert_eq!(payload.prev_randao, fake_prev_randao(head.number + 1));
        assert_eq!(payload.timestamp, chain.payload_at(head.number).timestamp + 2);
        assert_eq!(chain.head().hash, payload.block_hash);
    }

    #[tokio::test]
    async fn test_build_with_reorg() {
        let chain = MockChain::new();
        chain.extend(5, 0);
        let before = chain.canonical_hashes();
        let depth = 2;

        let payload =
            build_block(&chain, BlockBuildOpts { reorg_depth: depth, time_delta: 1, ..Default::default() })
                .await
                .unwrap();

        let after = chain.canonical_hashes();
        let base = before.len() - 1 - depth as usize;
        assert_eq!(payload.parent_hash, before[base]);
        assert_eq!(after[..=base], before[..=base]);
        assert_ne!(after[base + 1], before[base + 1]);
        assert_eq!(after.len(), base + 2);
    }

    #[tokio::test]
    async fn test_reorg_deeper_than_chain() {
        let chain = MockChain::new();
        chain.extend(2, 0);
        let err = build_block(&chain, BlockBuildOpts { reorg_depth: 3, ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ReorgTooDeep { depth: 3, head: 2 }));
    }

    #[tokio::test]
    async fn test_built_block_can_be_synced() {
        let a = MockChain::new();
        a.extend(2, 0);
        let b = a.fork_at(2);

        build_block(&a, BlockBuildOpts { time_delta: 2, ..Default::default() }).await.unwrap();
        build_block(&a, BlockBuildOpts { reorg_depth: 1, time_delta: 1, ..Default::default() })
            .await
            .unwrap();

        crate::sync_blocks_from(&b, &a).await.unwrap();
        assert_eq!(a.head(), b.head());
    }
}

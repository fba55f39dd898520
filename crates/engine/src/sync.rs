use crate::{EngineNode, ExecutionPayloadProvider, ForkchoiceState, SyncError};
use alloy_eips::{BlockId, BlockNumberOrTag};
use devnet_primitives::{BlockInfo, L1BlockRef};
use tracing::{debug, info};

/// Returns the finalized and safe blocks of the node.
///
/// Before a block was ever marked finalized or safe, execution clients report the tags as not
/// found. The genesis block is used in that case.
pub async fn finalized_and_safe<N>(node: &N) -> Result<(L1BlockRef, L1BlockRef), SyncError>
where
    N: ExecutionPayloadProvider + ?Sized,
{
    let finalized = block_or_genesis(node, BlockId::finalized()).await?;
    let safe = block_or_genesis(node, BlockId::safe()).await?;
    Ok((finalized, safe))
}

async fn block_or_genesis<N>(node: &N, block_id: BlockId) -> Result<L1BlockRef, SyncError>
where
    N: ExecutionPayloadProvider + ?Sized,
{
    if let Some(block) = node.block_ref(block_id).await? {
        return Ok(block)
    }
    node.block_ref(BlockId::Number(BlockNumberOrTag::Earliest))
        .await?
        .ok_or_else(|| SyncError::MissingBlock("genesis".to_string()))
}

/// Replays the chain of `src` into `dest` through the Engine API of `dest`.
///
/// First walks back from the head of `src` until a block is found that `dest` already has at the
/// same height. Every later block of `src` is then imported with `engine_newPayloadV1` and made
/// canonical with `engine_forkchoiceUpdatedV1`, keeping the safe and finalized blocks `dest` had
/// when the sync started. If `dest` already holds every block of `src` but follows a longer
/// chain, its head is moved back to the head of `src`. Returns the new head of `dest`, which is
/// the head of `src`.
///
/// Every imported block is persisted before the next one is requested, so an interrupted sync can
/// be resumed by calling this again.
pub async fn sync_blocks_from<D, S>(dest: &D, src: &S) -> Result<BlockInfo, SyncError>
where
    D: EngineNode + ?Sized,
    S: ExecutionPayloadProvider + ?Sized,
{
    let (finalized, safe) = finalized_and_safe(dest).await?;
    let fcs = ForkchoiceState::new(safe.block_info(), safe.block_info(), finalized.block_info());

    let src_head = src
        .block_ref(BlockId::latest())
        .await?
        .ok_or_else(|| SyncError::MissingBlock("source head".to_string()))?;

    let common = common_ancestor(dest, src, src_head).await?;
    info!(target: "devnet::sync", common = %common.block_info(), src_head = %src_head.block_info(), "found common ancestor");

    let mut head = common.block_info();
    let mut imported = 0usize;
    loop {
        let next = head.number + 1;
        let Some(payload) = src.execution_payload_by_block(BlockId::number(next)).await? else {
            break
        };
        if payload.parent_hash != head.hash {
            return Err(SyncError::Reorg {
                number: next,
                expected_parent: head.hash,
                parent: payload.parent_hash,
            })
        }

        let block = BlockInfo::from(&payload);
        let status = dest.new_payload(payload.clone()).await?;
        if !status.status.is_valid() {
            return Err(SyncError::PayloadNotValid {
                block,
                payload: Box::new(payload),
                status: status.status,
            })
        }

        let fcs = fcs.with_head(block);
        let forkchoice_updated = dest.forkchoice_updated(fcs.to_alloy(), None).await?;
        if !forkchoice_updated.payload_status.status.is_valid() {
            return Err(SyncError::ForkchoiceNotValid {
                head: block.hash,
                status: forkchoice_updated.payload_status.status,
            })
        }

        debug!(target: "devnet::sync", block = %block, "imported block");
        head = block;
        imported += 1;
    }

    if imported == 0 {
        rewind_head(dest, fcs, head).await?;
    }

    info!(target: "devnet::sync", head = %head, "synced blocks");
    Ok(head)
}

/// Makes `head` the head of `dest` when nothing had to be imported but `dest` follows a longer
/// chain. Safe and finalized blocks above `head` are moved down to it.
async fn rewind_head<D>(dest: &D, fcs: ForkchoiceState, head: BlockInfo) -> Result<(), SyncError>
where
    D: EngineNode + ?Sized,
{
    let current = dest.block_ref(BlockId::latest()).await?;
    if current.is_some_and(|current| current.hash == head.hash) {
        return Ok(())
    }

    let clamp = |block: BlockInfo| if block.number > head.number { head } else { block };
    let fcs = ForkchoiceState::new(head, clamp(fcs.safe), clamp(fcs.finalized));
    let forkchoice_updated = dest.forkchoice_updated(fcs.to_alloy(), None).await?;
    if !forkchoice_updated.payload_status.status.is_valid() {
        return Err(SyncError::ForkchoiceNotValid {
            head: head.hash,
            status: forkchoice_updated.payload_status.status,
        })
    }
    info!(
        target: "devnet::sync",
        from = ?current.map(|block| block.block_info()),
        to = %head,
        "rewound destination head"
    );
    Ok(())
}

/// Walks back from `from` on `src` until `dest` holds the same block at the same height.
async fn common_ancestor<D, S>(dest: &D, src: &S, from: L1BlockRef) -> Result<L1BlockRef, SyncError>
where
    D: ExecutionPayloadProvider + ?Sized,
    S: ExecutionPayloadProvider + ?Sized,
{
    let mut cursor = from;
    loop {
        let at_height = dest.block_ref(BlockId::number(cursor.number)).await?;
        if at_height.is_some_and(|block| block.hash == cursor.hash) {
            return Ok(cursor)
        }
        if cursor.number == 0 {
            return Err(SyncError::NoCommonAncestor)
        }
        cursor = src
            .block_ref(BlockId::hash(cursor.parent_hash))
            .await?
            .ok_or_else(|| SyncError::MissingBlock(format!("source block {}", cursor.parent_hash)))?;
    }
}

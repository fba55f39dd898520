use crate::ExecutionPayloadProviderError;
use alloy_eips::BlockId;
use alloy_json_rpc::RpcError;
use alloy_provider::Provider;
use alloy_rpc_types_engine::{ExecutionPayload, ExecutionPayloadV1};
use alloy_transport::TransportErrorKind;
use devnet_primitives::L1BlockRef;

/// The error code geth uses for an unknown block tag before the tag was ever set.
const UNKNOWN_BLOCK_CODE: i64 = -39001;

/// Implementers of the trait can read blocks of a chain as execution payloads.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait ExecutionPayloadProvider: Sync + Send {
    /// Returns the [`ExecutionPayloadV1`] for the provided [`BlockId`], or [None].
    async fn execution_payload_by_block(
        &self,
        block_id: BlockId,
    ) -> Result<Option<ExecutionPayloadV1>, ExecutionPayloadProviderError>;

    /// Returns the header reference of the block for the provided [`BlockId`], or [None].
    async fn block_ref(
        &self,
        block_id: BlockId,
    ) -> Result<Option<L1BlockRef>, ExecutionPayloadProviderError> {
        Ok(self.execution_payload_by_block(block_id).await?.map(|payload| L1BlockRef {
            hash: payload.block_hash,
            number: payload.block_number,
            parent_hash: payload.parent_hash,
            timestamp: payload.timestamp,
        }))
    }
}

/// The provider uses an [`Provider`] internally to implement the [`ExecutionPayloadProvider`]
/// trait.
#[derive(Default, Clone, Debug)]
pub struct AlloyExecutionPayloadProvider<P> {
    /// An alloy provider.
    provider: P,
}

impl<P: Provider> AlloyExecutionPayloadProvider<P> {
    /// Returns a new instance of a [`AlloyExecutionPayloadProvider`].
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Returns the inner provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait::async_trait]
impl<P: Provider> ExecutionPayloadProvider for AlloyExecutionPayloadProvider<P> {
    async fn execution_payload_by_block(
        &self,
        block_id: BlockId,
    ) -> Result<Option<ExecutionPayloadV1>, ExecutionPayloadProviderError> {
        tracing::trace!(target: "devnet::engine", ?block_id, "fetching execution payload");

        let block = not_found_as_none(self.provider.get_block(block_id).full().await)?;
        Ok(block.map(|b| {
            let (payload, _) = ExecutionPayload::from_block_slow(
                &b.into_consensus().map_transactions(|tx| tx.inner.into_inner()),
            );
            payload.as_v1().clone()
        }))
    }

    async fn block_ref(
        &self,
        block_id: BlockId,
    ) -> Result<Option<L1BlockRef>, ExecutionPayloadProviderError> {
        let block = not_found_as_none(self.provider.get_block(block_id).await)?;
        Ok(block.map(|b| L1BlockRef {
            hash: b.header.hash,
            number: b.header.number,
            parent_hash: b.header.parent_hash,
            timestamp: b.header.timestamp,
        }))
    }
}

/// Execution clients report unset `safe` and `finalized` tags as an error rather than an empty
/// result. Those are mapped to [None].
fn not_found_as_none<T>(
    result: Result<Option<T>, RpcError<TransportErrorKind>>,
) -> Result<Option<T>, ExecutionPayloadProviderError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if is_not_found(&err) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn is_not_found(err: &RpcError<TransportErrorKind>) -> bool {
    err.as_error_resp().is_some_and(|payload| {
        payload.code == UNKNOWN_BLOCK_CODE || payload.message.contains("not found")
    })
}

//! Test utilities for the engine crate.

use crate::{
    EngineApi, EngineApiError, EngineCall, EnginePayloadAttributes, ExecutionPayloadProvider,
    ExecutionPayloadProviderError, RejectionCode,
};
use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_json_rpc::{ErrorPayload, RpcError};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rpc_types_engine::{
    ExecutionPayloadV1, ForkchoiceState, ForkchoiceUpdated, PayloadId, PayloadStatus,
    PayloadStatusEnum,
};
use devnet_primitives::BlockInfo;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Timestamp of the mock genesis block.
const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// An in-memory chain that behaves like an execution client driven through the Engine API.
///
/// Block hashes are computed over the payload fields, so payloads that were tampered with are
/// reported invalid. Payloads built through [`EngineApi::forkchoice_updated`] are kept aside
/// until a forkchoice update makes them canonical, like execution clients do with locally built
/// blocks.
#[derive(Debug)]
pub struct MockChain {
    inner: Mutex<MockChainState>,
}

#[derive(Debug, Default, Clone)]
struct MockChainState {
    blocks: HashMap<B256, ExecutionPayloadV1>,
    canonical: Vec<B256>,
    safe: Option<B256>,
    finalized: Option<B256>,
    built: HashMap<PayloadId, ExecutionPayloadV1>,
    local: HashMap<B256, ExecutionPayloadV1>,
    next_payload_id: u64,
    reject_from: Option<u64>,
    new_payload_calls: usize,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    /// Returns a chain that only holds a genesis block.
    pub fn new() -> Self {
        Self::with_salt(0)
    }

    /// Returns a chain that only holds a genesis block. Chains with different salts do not share
    /// a genesis.
    pub fn with_salt(salt: u8) -> Self {
        let genesis = seal(ExecutionPayloadV1 {
            parent_hash: B256::ZERO,
            fee_recipient: Address::ZERO,
            state_root: B256::ZERO,
            receipts_root: B256::ZERO,
            logs_bloom: Default::default(),
            prev_randao: B256::ZERO,
            block_number: 0,
            gas_limit: 30_000_000,
            gas_used: 0,
            timestamp: GENESIS_TIMESTAMP,
            extra_data: Bytes::from(vec![salt]),
            base_fee_per_gas: U256::from(1_000_000_000u64),
            block_hash: B256::ZERO,
            transactions: vec![],
        });
        let mut state = MockChainState::default();
        state.canonical.push(genesis.block_hash);
        state.blocks.insert(genesis.block_hash, genesis);
        Self { inner: Mutex::new(state) }
    }

    /// Appends `count` blocks to the canonical chain. Blocks appended with different salts on the
    /// same parent differ.
    pub fn extend(&self, count: u64, salt: u8) {
        let mut state = self.inner.lock();
        for _ in 0..count {
            let parent = state.head_payload().clone();
            let block = seal(ExecutionPayloadV1 {
                parent_hash: parent.block_hash,
                fee_recipient: Address::with_last_byte(0xfe),
                block_number: parent.block_number + 1,
                timestamp: parent.timestamp + 2,
                prev_randao: B256::with_last_byte(salt),
                extra_data: Bytes::from(vec![salt]),
                ..parent
            });
            state.canonical.push(block.block_hash);
            state.blocks.insert(block.block_hash, block);
        }
    }

    /// Returns a new chain holding the canonical blocks of this chain up to and including
    /// `number`.
    pub fn fork_at(&self, number: u64) -> Self {
        let state = self.inner.lock();
        let canonical: Vec<B256> = state.canonical[..=number as usize].to_vec();
        let blocks = canonical.iter().map(|hash| (*hash, state.blocks[hash].clone())).collect();
        Self {
            inner: Mutex::new(MockChainState { blocks, canonical, ..Default::default() }),
        }
    }

    /// Returns the canonical head.
    pub fn head(&self) -> BlockInfo {
        self.inner.lock().head_payload().into()
    }

    /// Returns the canonical block at `number`.
    pub fn block_at(&self, number: u64) -> BlockInfo {
        (&self.payload_at(number)).into()
    }

    /// Returns the canonical payload at `number`.
    pub fn payload_at(&self, number: u64) -> ExecutionPayloadV1 {
        let state = self.inner.lock();
        state.blocks[&state.canonical[number as usize]].clone()
    }

    /// Returns the hashes of the canonical chain, indexed by block number.
    pub fn canonical_hashes(&self) -> Vec<B256> {
        self.inner.lock().canonical.clone()
    }

    /// Marks the canonical block at `number` safe.
    pub fn set_safe(&self, number: u64) {
        let mut state = self.inner.lock();
        state.safe = Some(state.canonical[number as usize]);
    }

    /// Marks the canonical block at `number` finalized.
    pub fn set_finalized(&self, number: u64) {
        let mut state = self.inner.lock();
        state.finalized = Some(state.canonical[number as usize]);
    }

    /// Reports every later imported payload at or above `number` as invalid.
    pub fn reject_payloads_from(&self, number: u64) {
        self.inner.lock().reject_from = Some(number);
    }

    /// Returns how many times `engine_newPayloadV1` was called.
    pub fn new_payload_calls(&self) -> usize {
        self.inner.lock().new_payload_calls
    }
}

impl MockChainState {
    fn head_payload(&self) -> &ExecutionPayloadV1 {
        let head = self.canonical.last().expect("chain always holds a genesis block");
        &self.blocks[head]
    }

    fn set_head(&mut self, head: B256) {
        let mut canonical = vec![head];
        let mut cursor = head;
        while let Some(block) = self.blocks.get(&cursor) {
            if block.block_number == 0 {
                break
            }
            cursor = block.parent_hash;
            canonical.push(cursor);
        }
        canonical.reverse();
        self.canonical = canonical;
    }

    fn by_id(&self, block_id: BlockId) -> Option<&ExecutionPayloadV1> {
        let hash = match block_id {
            BlockId::Hash(hash) => Some(hash.block_hash),
            BlockId::Number(BlockNumberOrTag::Number(number)) => {
                self.canonical.get(number as usize).copied()
            }
            BlockId::Number(BlockNumberOrTag::Latest | BlockNumberOrTag::Pending) => {
                self.canonical.last().copied()
            }
            BlockId::Number(BlockNumberOrTag::Earliest) => self.canonical.first().copied(),
            BlockId::Number(BlockNumberOrTag::Safe) => self.safe,
            BlockId::Number(BlockNumberOrTag::Finalized) => self.finalized,
        }?;
        self.blocks.get(&hash)
    }
}

/// Computes and sets the hash of the payload.
fn seal(mut payload: ExecutionPayloadV1) -> ExecutionPayloadV1 {
    payload.block_hash = payload_hash(&payload);
    payload
}

fn payload_hash(payload: &ExecutionPayloadV1) -> B256 {
    let mut preimage = Vec::new();
    preimage.extend_from_slice(payload.parent_hash.as_slice());
    preimage.extend_from_slice(payload.fee_recipient.as_slice());
    preimage.extend_from_slice(&payload.block_number.to_be_bytes());
    preimage.extend_from_slice(&payload.timestamp.to_be_bytes());
    preimage.extend_from_slice(payload.prev_randao.as_slice());
    preimage.extend_from_slice(&payload.extra_data);
    for tx in &payload.transactions {
        preimage.extend_from_slice(tx);
    }
    keccak256(preimage)
}

fn rejection(call: EngineCall, code: RejectionCode) -> EngineApiError {
    let message = format!("{code:?}");
    EngineApiError::ProtocolRejection {
        call,
        code,
        message: message.clone(),
        source: RpcError::ErrorResp(ErrorPayload { code: code.code(), message: message.into(), data: None }),
    }
}

#[async_trait::async_trait]
impl EngineApi for MockChain {
    async fn forkchoice_updated(
        &self,
        state: ForkchoiceState,
        attributes: Option<EnginePayloadAttributes>,
    ) -> Result<ForkchoiceUpdated, EngineApiError> {
        let mut chain = self.inner.lock();

        if let Some(local) = chain.local.remove(&state.head_block_hash) {
            chain.blocks.insert(local.block_hash, local);
        }
        let Some(head) = chain.blocks.get(&state.head_block_hash).cloned() else {
            return Ok(ForkchoiceUpdated {
                payload_status: PayloadStatus::from_status(PayloadStatusEnum::Syncing),
                payload_id: None,
            })
        };
        for hash in [state.safe_block_hash, state.finalized_block_hash] {
            if !hash.is_zero() && !chain.blocks.contains_key(&hash) {
                return Err(rejection(EngineCall::ForkchoiceUpdated, RejectionCode::InvalidForkchoiceState))
            }
        }

        chain.set_head(head.block_hash);
        if !state.safe_block_hash.is_zero() {
            chain.safe = Some(state.safe_block_hash);
        }
        if !state.finalized_block_hash.is_zero() {
            chain.finalized = Some(state.finalized_block_hash);
        }

        let payload_status = PayloadStatus::new(PayloadStatusEnum::Valid, Some(head.block_hash));
        let Some(attributes) = attributes else {
            return Ok(ForkchoiceUpdated { payload_status, payload_id: None })
        };

        let attributes = attributes.payload_attributes;
        if attributes.timestamp <= head.timestamp {
            return Err(rejection(EngineCall::ForkchoiceUpdated, RejectionCode::InvalidPayloadAttributes))
        }
        let payload = seal(ExecutionPayloadV1 {
            parent_hash: head.block_hash,
            fee_recipient: attributes.suggested_fee_recipient,
            block_number: head.block_number + 1,
            timestamp: attributes.timestamp,
            prev_randao: attributes.prev_randao,
            extra_data: Bytes::new(),
            transactions: vec![],
            ..head
        });

        chain.next_payload_id += 1;
        let payload_id = PayloadId::new(chain.next_payload_id.to_be_bytes());
        chain.local.insert(payload.block_hash, payload.clone());
        chain.built.insert(payload_id, payload);

        Ok(ForkchoiceUpdated { payload_status, payload_id: Some(payload_id) })
    }

    async fn new_payload(&self, payload: ExecutionPayloadV1) -> Result<PayloadStatus, EngineApiError> {
        let mut chain = self.inner.lock();
        chain.new_payload_calls += 1;

        if chain.reject_from.is_some_and(|from| payload.block_number >= from) ||
            payload_hash(&payload) != payload.block_hash
        {
            return Ok(PayloadStatus::new(
                PayloadStatusEnum::Invalid { validation_error: "rejected by mock".to_string() },
                None,
            ))
        }
        if !chain.blocks.contains_key(&payload.parent_hash) {
            return Ok(PayloadStatus::from_status(PayloadStatusEnum::Syncing))
        }

        let hash = payload.block_hash;
        chain.blocks.insert(hash, payload);
        Ok(PayloadStatus::new(PayloadStatusEnum::Valid, Some(hash)))
    }

    async fn get_payload(&self, payload_id: PayloadId) -> Result<ExecutionPayloadV1, EngineApiError> {
        self.inner
            .lock()
            .built
            .remove(&payload_id)
            .ok_or_else(|| rejection(EngineCall::GetPayload, RejectionCode::UnknownPayload))
    }
}

#[async_trait::async_trait]
impl ExecutionPayloadProvider for MockChain {
    async fn execution_payload_by_block(
        &self,
        block_id: BlockId,
    ) -> Result<Option<ExecutionPayloadV1>, ExecutionPayloadProviderError> {
        Ok(self.inner.lock().by_id(block_id).cloned())
    }
}

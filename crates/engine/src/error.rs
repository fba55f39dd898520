use alloy_json_rpc::RpcError;
use alloy_primitives::B256;
use alloy_rpc_types_engine::{ExecutionPayloadV1, PayloadStatusEnum};
use alloy_transport::TransportErrorKind;
use devnet_primitives::BlockInfo;
use std::time::Duration;

/// An Engine API method.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineCall {
    /// `engine_forkchoiceUpdatedV1`.
    ForkchoiceUpdated,
    /// `engine_newPayloadV1`.
    NewPayload,
    /// `engine_getPayloadV1`.
    GetPayload,
}

impl EngineCall {
    /// Returns the JSON-RPC method name.
    pub const fn method(&self) -> &'static str {
        match self {
            Self::ForkchoiceUpdated => "engine_forkchoiceUpdatedV1",
            Self::NewPayload => "engine_newPayloadV1",
            Self::GetPayload => "engine_getPayloadV1",
        }
    }
}

impl core::fmt::Display for EngineCall {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.method())
    }
}

/// The reason an execution client explicitly rejected an Engine API call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RejectionCode {
    /// The payload id is not known, e.g. because it was already retrieved or evicted.
    UnknownPayload,
    /// The forkchoice state is inconsistent.
    InvalidForkchoiceState,
    /// The payload attributes are invalid.
    InvalidPayloadAttributes,
    /// Any other code of the Engine API error range, e.g. an unsupported fork.
    Other(i64),
}

impl RejectionCode {
    /// Returns the classification of a JSON-RPC error code, if it is in the Engine API error
    /// range `-38999..=-38000`.
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            -38001 => Some(Self::UnknownPayload),
            -38002 => Some(Self::InvalidForkchoiceState),
            -38003 => Some(Self::InvalidPayloadAttributes),
            -38999..=-38000 => Some(Self::Other(code)),
            _ => None,
        }
    }

    /// Returns the JSON-RPC error code.
    pub const fn code(&self) -> i64 {
        match self {
            Self::UnknownPayload => -38001,
            Self::InvalidForkchoiceState => -38002,
            Self::InvalidPayloadAttributes => -38003,
            Self::Other(code) => *code,
        }
    }
}

/// An error returned by an Engine API call.
///
/// A negative [`PayloadStatusEnum`] is not an error: the call succeeded and carries a verdict the
/// caller must check.
#[derive(Debug, thiserror::Error)]
pub enum EngineApiError {
    /// The engine explicitly rejected the request.
    #[error("{call} rejected ({code:?}): {message}")]
    ProtocolRejection {
        /// The rejected call.
        call: EngineCall,
        /// The rejection classification.
        code: RejectionCode,
        /// The message returned by the engine.
        message: String,
        /// The original RPC error.
        #[source]
        source: RpcError<TransportErrorKind>,
    },
    /// The call did not complete in time.
    #[error("{call} timed out after {after:?}")]
    Timeout {
        /// The call that timed out.
        call: EngineCall,
        /// The timeout that was applied.
        after: Duration,
    },
    /// The call failed for any other reason: connection failure, malformed response or an
    /// unexpected error response.
    #[error("{call} failed: {source}")]
    Transport {
        /// The failed call.
        call: EngineCall,
        /// The original RPC error.
        #[source]
        source: RpcError<TransportErrorKind>,
    },
}

impl EngineApiError {
    /// Classifies an RPC error returned by `call`.
    pub fn from_rpc(call: EngineCall, error: RpcError<TransportErrorKind>) -> Self {
        let rejection = error.as_error_resp().and_then(|payload| {
            RejectionCode::from_code(payload.code).map(|code| (code, payload.message.to_string()))
        });
        match rejection {
            Some((code, message)) => Self::ProtocolRejection { call, code, message, source: error },
            None => Self::Transport { call, source: error },
        }
    }

    /// Returns the rejection code if the engine explicitly rejected the call.
    pub const fn rejection_code(&self) -> Option<RejectionCode> {
        match self {
            Self::ProtocolRejection { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the call timed out.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// An error returned by an [`super::ExecutionPayloadProvider`].
#[derive(Debug, thiserror::Error)]
pub enum ExecutionPayloadProviderError {
    /// The underlying RPC call failed.
    #[error("transport error: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),
}

/// An error returned by the chain sync and block building algorithms.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// An Engine API call failed.
    #[error(transparent)]
    Engine(#[from] EngineApiError),
    /// Reading a chain failed.
    #[error(transparent)]
    Provider(#[from] ExecutionPayloadProviderError),
    /// A block that must exist was not found.
    #[error("missing block {0}")]
    MissingBlock(String),
    /// The source chain reorged while it was being replayed.
    #[error("source reorged at block {number}: expected parent {expected_parent}, got {parent}")]
    Reorg {
        /// The number of the block that no longer builds on the replayed chain.
        number: u64,
        /// The hash of the previously imported block.
        expected_parent: B256,
        /// The parent hash of the new block.
        parent: B256,
    },
    /// The source and destination do not share a genesis block.
    #[error("no common ancestor between source and destination")]
    NoCommonAncestor,
    /// The engine did not accept an imported payload as valid.
    #[error("payload {block} was not accepted as valid: {status}")]
    PayloadNotValid {
        /// The block of the payload.
        block: BlockInfo,
        /// The rejected payload.
        payload: Box<ExecutionPayloadV1>,
        /// The status returned by the engine.
        status: PayloadStatusEnum,
    },
    /// A forkchoice update returned a non valid status.
    #[error("forkchoice update to {head} was not valid: {status}")]
    ForkchoiceNotValid {
        /// The requested head.
        head: B256,
        /// The status returned by the engine.
        status: PayloadStatusEnum,
    },
    /// A forkchoice update with attributes did not return a payload id.
    #[error("forkchoice update on {0} did not start a payload build")]
    MissingPayloadId(B256),
    /// The requested reorg is deeper than the chain.
    #[error("cannot reorg {depth} deep, head is at block height {head}")]
    ReorgTooDeep {
        /// The requested depth.
        depth: u64,
        /// The current head height.
        head: u64,
    },
}

//! Engine API driver of the devnet harness.
//!
//! [`EngineClient`] speaks the three-call Engine API handshake (`engine_forkchoiceUpdatedV1`,
//! `engine_newPayloadV1` and `engine_getPayloadV1`) against a single execution client. On top of
//! it, [`sync_blocks_from`] replays a chain from one node into another and [`build_block`]
//! authors new blocks, optionally on an older base to force a reorg.

mod api;
pub use api::{EngineApi, EngineClient, EngineKind, EngineNode};

mod attributes;
pub use attributes::EnginePayloadAttributes;

mod build;
pub use build::{build_block, fake_prev_randao, BlockBuildOpts};

mod error;
pub use error::{EngineApiError, EngineCall, ExecutionPayloadProviderError, RejectionCode, SyncError};

mod fcs;
pub use fcs::ForkchoiceState;

mod metrics;
pub use metrics::EngineApiMetrics;

mod payload;
pub use payload::{AlloyExecutionPayloadProvider, ExecutionPayloadProvider};

mod sync;
pub use sync::{finalized_and_safe, sync_blocks_from};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use alloy_primitives::{Bytes, U64};
use alloy_rpc_types_engine::PayloadAttributes;
use serde::{Deserialize, Serialize};

/// Payload attributes as understood by rollup execution engines: the L1 attributes extended with
/// a forced transaction list and the option to skip the transaction pool.
///
/// L1 engines only accept the plain attributes, see [`super::EngineKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnginePayloadAttributes {
    /// The standard payload attributes.
    #[serde(flatten)]
    pub payload_attributes: PayloadAttributes,
    /// Transactions that must be included first in the block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Bytes>>,
    /// If set, the block is built from [`Self::transactions`] only.
    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub no_tx_pool: bool,
    /// The gas limit of the block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<U64>,
}

impl EnginePayloadAttributes {
    /// Returns attributes that only carry the standard fields.
    pub const fn new(payload_attributes: PayloadAttributes) -> Self {
        Self { payload_attributes, transactions: None, no_tx_pool: false, gas_limit: None }
    }

    /// Returns true if the attributes use any rollup-only field.
    pub const fn has_rollup_fields(&self) -> bool {
        self.transactions.is_some() || self.no_tx_pool || self.gas_limit.is_some()
    }
}

impl From<PayloadAttributes> for EnginePayloadAttributes {
    fn from(value: PayloadAttributes) -> Self {
        Self::new(value)
    }
}

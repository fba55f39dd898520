use alloy_json_rpc::RpcError;
use alloy_transport::TransportErrorKind;
use std::time::Duration;

/// An error returned by a node handle.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// An RPC call to the node failed.
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// An RPC call did not complete in time.
    #[error("{method} timed out after {after:?}")]
    Timeout {
        /// The method that timed out.
        method: &'static str,
        /// The timeout that elapsed.
        after: Duration,
    },
    /// The node reported an enode that could not be parsed.
    #[error("invalid enode: {0}")]
    InvalidEnode(String),
    /// A node endpoint could not be formed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

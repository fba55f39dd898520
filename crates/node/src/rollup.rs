use crate::NodeError;
use alloy_json_rpc::{RpcError, RpcRecv, RpcSend};
use alloy_network::Ethereum;
use alloy_provider::{Provider, RootProvider};
use alloy_transport::TransportErrorKind;
use devnet_primitives::{constants::RPC_CALL_TIMEOUT, SyncStatus};
use std::{future::IntoFuture, time::Duration};
use tracing::debug;
use url::Url;

/// Runs the RPC `call` to `method`, failing with [`NodeError::Timeout`] after `after`.
pub(crate) async fn bounded<F, T>(method: &'static str, after: Duration, call: F) -> Result<T, NodeError>
where
    F: IntoFuture<Output = Result<T, RpcError<TransportErrorKind>>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(NodeError::Timeout { method, after }),
    }
}

/// A JSON-RPC endpoint of a node whose calls are each bounded by a timeout.
#[derive(Debug, Clone)]
struct BoundedRpc {
    provider: RootProvider<Ethereum>,
    timeout: Duration,
}

impl BoundedRpc {
    fn new(url: Url) -> Self {
        Self { provider: RootProvider::new_http(url), timeout: RPC_CALL_TIMEOUT }
    }

    async fn request<Params, Resp>(&self, method: &'static str, params: Params) -> Result<Resp, NodeError>
    where
        Params: RpcSend,
        Resp: RpcRecv,
    {
        bounded(method, self.timeout, self.provider.client().request(method, params)).await
    }
}

/// A client of the rollup node status RPC.
#[derive(Debug, Clone)]
pub struct RollupClient {
    rpc: BoundedRpc,
}

impl RollupClient {
    /// Returns a client of the rollup RPC at `url`.
    pub fn new(url: Url) -> Self {
        Self { rpc: BoundedRpc::new(url) }
    }

    /// Sets the timeout applied to each call.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.rpc.timeout = timeout;
        self
    }

    /// Returns the sync status of the rollup node.
    pub async fn sync_status(&self) -> Result<SyncStatus, NodeError> {
        self.rpc.request("optimism_syncStatus", ()).await
    }
}

/// A client of the rollup node P2P control RPC.
#[derive(Debug, Clone)]
pub struct P2pClient {
    rpc: BoundedRpc,
}

impl P2pClient {
    /// Returns a client of the P2P RPC at `url`.
    pub fn new(url: Url) -> Self {
        Self { rpc: BoundedRpc::new(url) }
    }

    /// Sets the timeout applied to each call.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.rpc.timeout = timeout;
        self
    }

    /// Asks the node to connect to the peer at `multiaddr`.
    pub async fn connect_peer(&self, multiaddr: &str) -> Result<(), NodeError> {
        debug!(target: "devnet::node", multiaddr, "connecting peer");
        let _: Option<()> = self.rpc.request("opp2p_connectPeer", (multiaddr.to_string(),)).await?;
        Ok(())
    }
}

use crate::{rollup::bounded, ContainerInfo, NodeError, P2pClient, RollupClient};
use alloy_network::Ethereum;
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_engine::JwtSecret;
use devnet_engine::{EngineClient, EngineKind};
use devnet_primitives::constants::{
    ENGINE_PORT, HTTP_RPC_PORT, OP_NODE_P2P_PORT, ROLLUP_RPC_PORT, RPC_CALL_TIMEOUT, WS_RPC_PORT,
};
use devnet_signer::{p2p_multiaddr, peer_id, PrivateKeySigner};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use url::Url;

fn endpoint(scheme: &str, ip: IpAddr, port: u16) -> Result<Url, NodeError> {
    Ok(Url::parse(&format!("{scheme}://{}", SocketAddr::new(ip, port)))?)
}

/// An execution client of the devnet: an L1 node or an L2 engine.
#[derive(Debug, Clone)]
pub struct ExecutionNode {
    container: ContainerInfo,
    client: String,
    engine: EngineClient,
    eth: RootProvider<Ethereum>,
}

/// An L1 execution client.
pub type L1Node = ExecutionNode;

/// An L2 execution engine.
pub type L2Engine = ExecutionNode;

/// The subset of `admin_nodeInfo` the devnet reads.
#[derive(Debug, Deserialize)]
struct NodeInfo {
    enode: String,
}

impl ExecutionNode {
    /// Returns a handle of the execution client `client` running in `container`. The Engine API is
    /// authenticated with `jwt`.
    pub fn new(
        container: ContainerInfo,
        client: impl Into<String>,
        kind: EngineKind,
        jwt: JwtSecret,
    ) -> Result<Self, NodeError> {
        let engine = EngineClient::new(kind, endpoint("http", container.ip, ENGINE_PORT)?, Some(jwt));
        let eth = RootProvider::new_http(endpoint("http", container.ip, HTTP_RPC_PORT)?);
        Ok(Self { container, client: client.into(), engine, eth })
    }

    /// Returns the container of the node.
    pub const fn container(&self) -> &ContainerInfo {
        &self.container
    }

    /// Returns the client name.
    pub fn client(&self) -> &str {
        &self.client
    }

    /// Returns the Engine API client of the node.
    pub const fn engine(&self) -> &EngineClient {
        &self.engine
    }

    /// Returns the JSON-RPC provider of the node.
    pub const fn eth(&self) -> &RootProvider<Ethereum> {
        &self.eth
    }

    /// Returns the HTTP JSON-RPC endpoint.
    pub fn http_url(&self) -> Result<Url, NodeError> {
        endpoint("http", self.container.ip, HTTP_RPC_PORT)
    }

    /// Returns the websocket JSON-RPC endpoint.
    pub fn ws_url(&self) -> Result<Url, NodeError> {
        endpoint("ws", self.container.ip, WS_RPC_PORT)
    }

    /// Returns the authenticated Engine API endpoint.
    pub fn engine_url(&self) -> Result<Url, NodeError> {
        endpoint("http", self.container.ip, ENGINE_PORT)
    }

    /// Returns the enode of the node, reachable at its container address.
    pub async fn enode(&self) -> Result<String, NodeError> {
        let info: NodeInfo = bounded(
            "admin_nodeInfo",
            RPC_CALL_TIMEOUT,
            self.eth.client().request_noparams("admin_nodeInfo"),
        )
        .await?;
        rewrite_enode_host(&info.enode, self.container.ip)
    }
}

/// Replaces the host of `enode` with `ip`. Nodes report the address they listen on, which is not
/// reachable from other containers.
fn rewrite_enode_host(enode: &str, ip: IpAddr) -> Result<String, NodeError> {
    let invalid = || NodeError::InvalidEnode(enode.to_string());
    let rest = enode.strip_prefix("enode://").ok_or_else(invalid)?;
    let (id, address) = rest.split_once('@').ok_or_else(invalid)?;
    let (_, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    if id.is_empty() || port.is_empty() {
        return Err(invalid())
    }

    let host = match ip {
        IpAddr::V4(ip) => ip.to_string(),
        IpAddr::V6(ip) => format!("[{ip}]"),
    };
    Ok(format!("enode://{id}@{host}:{port}"))
}

/// A rollup node of the devnet.
#[derive(Debug, Clone)]
pub struct RollupNode {
    container: ContainerInfo,
    index: usize,
    sequencer: bool,
    peer_id: String,
    multiaddr: String,
    rollup: RollupClient,
    p2p: P2pClient,
}

impl RollupNode {
    /// Returns a handle of the `index`-th rollup node, running in `container` with the P2P
    /// identity `p2p_key`.
    pub fn new(
        container: ContainerInfo,
        index: usize,
        sequencer: bool,
        p2p_key: &PrivateKeySigner,
    ) -> Result<Self, NodeError> {
        let url = endpoint("http", container.ip, ROLLUP_RPC_PORT)?;
        Ok(Self {
            peer_id: peer_id(p2p_key),
            multiaddr: p2p_multiaddr(container.ip, OP_NODE_P2P_PORT, p2p_key),
            rollup: RollupClient::new(url.clone()),
            p2p: P2pClient::new(url),
            container,
            index,
            sequencer,
        })
    }

    /// Returns the container of the node.
    pub const fn container(&self) -> &ContainerInfo {
        &self.container
    }

    /// Returns the index of the node among the rollup nodes.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns true if the node sequences blocks.
    pub const fn is_sequencer(&self) -> bool {
        self.sequencer
    }

    /// Returns the libp2p peer id of the node.
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Returns the multiaddr other nodes can reach this node at.
    pub fn multiaddr(&self) -> &str {
        &self.multiaddr
    }

    /// Returns the rollup status client.
    pub const fn rollup(&self) -> &RollupClient {
        &self.rollup
    }

    /// Returns the P2P control client.
    pub const fn p2p(&self) -> &P2pClient {
        &self.p2p
    }

    /// Returns the rollup RPC endpoint.
    pub fn rpc_url(&self) -> Result<Url, NodeError> {
        endpoint("http", self.container.ip, ROLLUP_RPC_PORT)
    }

    /// Connects this node to `peer`.
    pub async fn connect_to(&self, peer: &Self) -> Result<(), NodeError> {
        self.p2p.connect_peer(peer.multiaddr()).await
    }
}

/// The output proposer of the devnet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposerNode {
    /// The container of the proposer.
    pub container: ContainerInfo,
}

/// The batch submitter of the devnet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatcherNode {
    /// The container of the batcher.
    pub container: ContainerInfo,
}

//! Devnet nodes and the container runtime they run in.
//!
//! Every node of the devnet runs in a container started through a [`ContainerRuntime`]. Once a
//! container is up, it is wrapped in a typed handle exposing the clients for its role:
//! [`ExecutionNode`] for L1 nodes and L2 engines, [`RollupNode`] for rollup nodes, and
//! [`ProposerNode`] / [`BatcherNode`] for the L1 submitters.

mod clients;
pub use clients::{ClientDefinition, ClientsByRole, Role};

mod error;
pub use error::NodeError;

mod nodes;
pub use nodes::{BatcherNode, ExecutionNode, L1Node, L2Engine, ProposerNode, RollupNode};

mod rollup;
pub use rollup::{P2pClient, RollupClient};

pub mod runtime;
pub use runtime::{
    ContainerId, ContainerInfo, ContainerRuntime, DockerCli, NetworkId, RuntimeError, StartOptions,
};
#[cfg(any(test, feature = "test-utils"))]
pub use runtime::{MockRuntime, RuntimeEvent};

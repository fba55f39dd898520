//! Well-known values of the devnet: chain ids, ports and container paths.

use alloy_primitives::{address, Address};
use std::time::Duration;

/// The chain id of the L1 chain.
pub const L1_CHAIN_ID: u64 = 901;

/// The chain id of the L2 chain.
pub const L2_CHAIN_ID: u64 = 902;

/// The HTTP JSON-RPC port exposed by execution clients.
pub const HTTP_RPC_PORT: u16 = 8545;

/// The websocket JSON-RPC port exposed by execution clients.
pub const WS_RPC_PORT: u16 = 8546;

/// The authenticated Engine API port exposed by execution clients.
pub const ENGINE_PORT: u16 = 8551;

/// The JSON-RPC port exposed by rollup nodes.
pub const ROLLUP_RPC_PORT: u16 = 8545;

/// The libp2p TCP port rollup nodes listen on.
pub const OP_NODE_P2P_PORT: u16 = 9003;

/// Where the chain genesis is placed in execution client containers.
pub const GENESIS_PATH: &str = "/genesis.json";

/// Where the rollup config is placed in rollup node containers.
pub const ROLLUP_CONFIG_PATH: &str = "/rollup_config.json";

/// Where the Engine API JWT secret is placed in every container that needs it.
pub const JWT_SECRET_PATH: &str = "/hive/input/jwt-secret.txt";

/// Where the rollup node p2p private key is placed.
pub const P2P_PRIV_KEY_PATH: &str = "/hive/input/p2p_priv.txt";

/// The batch inbox address batches are submitted to on L1.
pub const BATCH_INBOX_ADDRESS: Address = address!("0x42000000000000000000000000000000000000ff");

/// The timeout applied to a single Engine API call.
pub const ENGINE_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// The timeout applied to a single call of the rollup node and execution node control RPCs.
pub const RPC_CALL_TIMEOUT: Duration = Duration::from_secs(10);

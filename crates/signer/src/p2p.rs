use alloy_primitives::hex;
use alloy_signer::k256::elliptic_curve::sec1::ToEncodedPoint;
use alloy_signer_local::PrivateKeySigner;
use std::net::IpAddr;

/// Protobuf prefix of a libp2p `PublicKey` message: key type secp256k1 followed by a 33 byte
/// data field.
const SECP256K1_PUBLIC_KEY_PREFIX: [u8; 4] = [0x08, 0x02, 0x12, 0x21];

/// Multihash prefix of an identity hash over the 37 byte encoded public key.
const IDENTITY_MULTIHASH_PREFIX: [u8; 2] = [0x00, 0x25];

/// Returns the libp2p peer id of the node using `key` as its identity.
pub fn peer_id(key: &PrivateKeySigner) -> String {
    let point = key.credential().verifying_key().to_encoded_point(true);

    let mut bytes = Vec::with_capacity(2 + 4 + 33);
    bytes.extend_from_slice(&IDENTITY_MULTIHASH_PREFIX);
    bytes.extend_from_slice(&SECP256K1_PUBLIC_KEY_PREFIX);
    bytes.extend_from_slice(point.as_bytes());

    bs58::encode(bytes).into_string()
}

/// Returns the multiaddr other rollup nodes dial to reach the node at `ip`.
pub fn p2p_multiaddr(ip: IpAddr, port: u16, key: &PrivateKeySigner) -> String {
    let protocol = match ip {
        IpAddr::V4(_) => "ip4",
        IpAddr::V6(_) => "ip6",
    };
    format!("/{protocol}/{ip}/tcp/{port}/p2p/{}", peer_id(key))
}

/// Encodes the private key the way rollup nodes read it from their key file: lowercase hex with
/// no prefix.
pub fn encode_private_key(key: &PrivateKeySigner) -> String {
    hex::encode(key.to_bytes())
}
